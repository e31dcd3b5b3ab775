//! Trait interfaces between the controller and its environment.
//!
//! - [`TokenLedger`]: incentive-token balances and transfers (the token
//!   contract's job; [`MemoryLedger`](crate::ledger::MemoryLedger) implements
//!   it in memory)
//! - [`Clock`]: the host's notion of "now", driving epoch rollover

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::LedgerError;
use crate::types::{Address, Transfer};

/// Balances and allowances of the incentive token.
///
/// The controller never caches anything read from here across calls.
pub trait TokenLedger: Send + Sync {
    /// Current balance of `account` in base units.
    fn balance_of(&self, account: &Address) -> u128;

    /// Amount `spender` may still move out of `owner`'s balance.
    fn allowance(&self, owner: &Address, spender: &Address) -> u128;

    /// Execute `transfers` in order as one atomic unit.
    ///
    /// Either every transfer is applied or, on the first failure, none is
    /// and the error is returned. Zero-amount transfers are no-ops.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientFunds`] if a sender's balance (after the
    ///   earlier transfers in the batch) cannot cover its transfer
    /// - [`LedgerError::InsufficientAllowance`] if a `transfer_from` exceeds
    ///   the remaining allowance
    /// - [`LedgerError::BalanceOverflow`] if a recipient balance would overflow
    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), LedgerError>;
}

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall-clock time from the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        // Pre-1970 clocks read as zero.
        u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
    }
}

/// A settable clock for tests and replay.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// advance the clock owned by a controller.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self { now: Arc::new(AtomicU64::new(now)) }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(100);
        let handle = clock.clone();
        handle.advance(50);
        assert_eq!(clock.now(), 150);
        handle.set(10);
        assert_eq!(clock.now(), 10);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
