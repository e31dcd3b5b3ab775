//! Lock-guarded controller for hosts that serve swaps from several threads.

use parking_lot::Mutex;

use incentive_core::error::IncentiveError;
use incentive_core::traits::{Clock, TokenLedger};
use incentive_core::types::{IncentiveOutcome, TradeContext};

use crate::controller::IncentiveController;

/// An [`IncentiveController`] behind a mutex.
///
/// Each call holds the lock from classification to the epoch commit, so
/// concurrent buys can never both spend the same remaining budget. Wrap in
/// an `Arc` to share.
pub struct SharedController<L, C> {
    inner: Mutex<IncentiveController<L, C>>,
}

impl<L: TokenLedger, C: Clock> SharedController<L, C> {
    pub fn new(controller: IncentiveController<L, C>) -> Self {
        Self { inner: Mutex::new(controller) }
    }

    pub fn conduct_checks(&self, trade: &TradeContext) -> Result<IncentiveOutcome, IncentiveError> {
        self.inner.lock().conduct_checks(trade)
    }

    pub fn quote(&self, trade: &TradeContext) -> Result<IncentiveOutcome, IncentiveError> {
        self.inner.lock().quote(trade)
    }

    /// Run `f` with exclusive access, e.g. for operator calls or reads that
    /// must see a consistent ledger and budget.
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut IncentiveController<L, C>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn into_inner(self) -> IncentiveController<L, C> {
        self.inner.into_inner()
    }
}

impl<L: TokenLedger, C: Clock> From<IncentiveController<L, C>> for SharedController<L, C> {
    fn from(controller: IncentiveController<L, C>) -> Self {
        Self::new(controller)
    }
}
