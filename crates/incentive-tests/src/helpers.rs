//! Shared fixtures for scenario and invariant tests.

use incentive_core::config::{ConfigStore, IncentiveConfig};
use incentive_core::constants::WAD;
use incentive_core::ledger::MemoryLedger;
use incentive_core::traits::ManualClock;
use incentive_core::types::{Address, TradeContext};
use incentive_engine::IncentiveController;

pub type TestController = IncentiveController<MemoryLedger, ManualClock>;

/// One-hour epochs keep rollover tests readable.
pub const EPOCH_SECS: u64 = 3_600;

/// Address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address::from_bytes([seed; 20])
}

pub fn operator() -> Address {
    addr(1)
}

pub fn incentive_token() -> Address {
    addr(2)
}

pub fn fund() -> Address {
    addr(3)
}

pub fn controller_address() -> Address {
    addr(10)
}

/// Whole tokens to base units.
pub fn tokens(n: u128) -> u128 {
    n * WAD
}

/// Price given in basis points of 1.0 (`6_000` = 0.60).
pub fn price_bps(bps: u128) -> u128 {
    WAD / 10_000 * bps
}

/// A controller with default economics, its epoch starting at 0, and the
/// clock handle that drives it.
pub fn make_controller(ledger: MemoryLedger) -> (TestController, ManualClock) {
    make_controller_with(ledger, IncentiveConfig::new(incentive_token(), fund()))
}

pub fn make_controller_with(ledger: MemoryLedger, config: IncentiveConfig) -> (TestController, ManualClock) {
    let clock = ManualClock::new(0);
    let store = ConfigStore::new(operator(), config).unwrap();
    let controller =
        IncentiveController::new(controller_address(), store, EPOCH_SECS, Some(0), ledger, clock.clone()).unwrap();
    (controller, clock)
}

/// A ledger where each trader holds `balance` and has approved the
/// controller for all of it, and the controller holds `reserve`.
pub fn make_ledger(traders: &[Address], balance: u128, reserve: u128) -> MemoryLedger {
    let mut ledger = MemoryLedger::new();
    for t in traders {
        ledger.mint(*t, balance).unwrap();
        ledger.approve(*t, controller_address(), u128::MAX);
    }
    ledger.mint(controller_address(), reserve).unwrap();
    ledger
}

pub fn sell(reserve: u128, price: u128, amount_in: u128, trader: Address) -> TradeContext {
    TradeContext::sell(reserve, price, amount_in, trader)
}

pub fn buy(reserve: u128, price: u128, amount_out: u128, trader: Address) -> TradeContext {
    TradeContext::buy(reserve, price, amount_out, trader)
}
