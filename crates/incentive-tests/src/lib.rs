//! Cross-crate test suite for the peg incentive controller.
//!
//! Integration tests drive a full [`IncentiveController`] over an in-memory
//! ledger and a manual clock: the reference scenarios with exact expected
//! amounts, and randomized trade sequences that must never break the
//! conservation and budget invariants.
//!
//! [`IncentiveController`]: incentive_engine::IncentiveController

pub mod helpers;
