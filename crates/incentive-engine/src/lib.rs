//! # incentive-engine: Swap incentive decisions.
//!
//! All calculations use integer arithmetic only, with 256-bit intermediates
//! for fixed-point products.
//!
//! - **Classification**: a swap is a sell (protocol token in) or a buy
//!   (protocol token out).
//! - **Penalty**: sells pay a share of their volume weighted by how far the
//!   price sits below the penalty target, plus any excess price impact.
//! - **Reward**: buys earn a share of the epoch budget proportional to their
//!   share of expected volume and the distance to the reward target,
//!   decaying as the budget is spent.
//! - **Distribution**: penalties are split between the controller and the
//!   ecosystem fund.
//! - **Controller**: sequences the above and moves tokens atomically.

pub mod classifier;
pub mod controller;
pub mod distributor;
pub mod epoch;
pub mod math;
pub mod penalty;
pub mod reward;
pub mod shared;

pub use classifier::classify;
pub use controller::IncentiveController;
pub use distributor::{distribute_penalty, PenaltySplit};
pub use epoch::{EpochBudgetTracker, EpochPhase};
pub use penalty::{compute_penalty, PenaltyQuote};
pub use reward::{compute_reward, RewardQuote};
pub use shared::SharedController;
