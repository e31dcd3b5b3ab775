//! # incentive-core
//! Foundation types, configuration, and ledger interfaces for the peg
//! incentive controller.

pub mod amount;
pub mod config;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod traits;
pub mod types;
