//! Trade-by-trade orchestration.
//!
//! [`IncentiveController`] is the only stateful piece: it owns the
//! configuration, the epoch tracker, the ledger handle and the clock. Each
//! call first plans its effects against a working copy of the tracker, then
//! hands the resulting transfers to the ledger as one atomic batch, and only
//! writes the tracker back once that batch has gone through. A failed call
//! leaves balances and budget exactly as they were.

use incentive_core::config::{ConfigStore, DeploymentParams, IncentiveConfig};
use incentive_core::error::{ConfigError, IncentiveError};
use incentive_core::traits::{Clock, TokenLedger};
use incentive_core::types::{Address, IncentiveOutcome, TradeContext, TradeKind, Transfer};
use tracing::{debug, info, warn};

use crate::classifier::classify;
use crate::distributor::distribute_penalty;
use crate::epoch::EpochBudgetTracker;
use crate::penalty::compute_penalty;
use crate::reward::compute_reward;

/// Everything a call will do, computed before anything is done.
struct Plan {
    outcome: IncentiveOutcome,
    transfers: Vec<Transfer>,
    /// Tracker state to install after the transfers succeed (buys only).
    epoch: Option<EpochBudgetTracker>,
}

/// Penalises sells and rewards buys of the protocol token.
pub struct IncentiveController<L, C> {
    address: Address,
    store: ConfigStore,
    epoch: EpochBudgetTracker,
    ledger: L,
    clock: C,
}

impl<L: TokenLedger, C: Clock> IncentiveController<L, C> {
    /// Create a controller holding incentive tokens at `address`.
    ///
    /// The first epoch starts at `epoch_start_time`, or at the clock's
    /// current reading if `None`.
    pub fn new(
        address: Address,
        store: ConfigStore,
        epoch_duration_secs: u64,
        epoch_start_time: Option<u64>,
        ledger: L,
        clock: C,
    ) -> Result<Self, ConfigError> {
        if address.is_zero() {
            return Err(ConfigError::InvalidParameter {
                field: "controller",
                reason: "zero address".into(),
            });
        }
        check_duration(epoch_duration_secs)?;
        let start = epoch_start_time.unwrap_or_else(|| clock.now());
        Ok(Self {
            address,
            store,
            epoch: EpochBudgetTracker::new(start, epoch_duration_secs),
            ledger,
            clock,
        })
    }

    /// Build a controller from validated deployment parameters.
    pub fn from_deployment(params: &DeploymentParams, ledger: L, clock: C) -> Result<Self, ConfigError> {
        params.validate()?;
        let store = ConfigStore::new(params.operator, params.incentive_config())?;
        let controller = Self::new(
            params.controller,
            store,
            params.epoch_duration_secs,
            params.epoch_start_time,
            ledger,
            clock,
        )?;
        info!(
            controller = %params.controller,
            pair = %params.pair,
            protocol_token = %params.protocol_token,
            price_feed = params.price_feed.map(tracing::field::display),
            epoch_start = controller.epoch.epoch_start_time(),
            "incentive controller deployed"
        );
        Ok(controller)
    }

    /// Apply the penalty or reward for one swap.
    ///
    /// # Errors
    ///
    /// Any error leaves the ledger and the epoch budget untouched.
    ///
    /// - `MalformedTrade` kinds for trades that are not exactly a sell or a buy,
    ///   or whose pair readings are unusable
    /// - `InsufficientFunds` kinds if the trader cannot pay the penalty or the
    ///   controller cannot pay the reward
    pub fn conduct_checks(&mut self, trade: &TradeContext) -> Result<IncentiveOutcome, IncentiveError> {
        let now = self.clock.now();
        let plan = self.plan(trade, now)?;

        if let Err(e) = self.ledger.execute(&plan.transfers) {
            warn!(trader = %trade.recipient, kind = %plan.outcome.kind(), "incentive transfer failed: {e}");
            return Err(e.into());
        }
        if let Some(epoch) = plan.epoch {
            self.epoch = epoch;
        }

        match &plan.outcome {
            IncentiveOutcome::Penalty { charged, kept, redirected } => info!(
                trader = %trade.recipient,
                charged = %charged,
                kept = %kept,
                redirected = %redirected,
                "penalty applied"
            ),
            IncentiveOutcome::Reward { requested, granted } => info!(
                trader = %trade.recipient,
                requested = %requested,
                granted = %granted,
                paid_this_epoch = %self.epoch.rewards_paid_this_epoch(),
                "reward applied"
            ),
        }
        Ok(plan.outcome)
    }

    /// The outcome [`conduct_checks`](Self::conduct_checks) would produce
    /// right now, without moving tokens or touching the budget.
    ///
    /// Does not check that the trader or the controller can actually pay.
    pub fn quote(&self, trade: &TradeContext) -> Result<IncentiveOutcome, IncentiveError> {
        Ok(self.plan(trade, self.clock.now())?.outcome)
    }

    fn plan(&self, trade: &TradeContext, now: u64) -> Result<Plan, IncentiveError> {
        let config = self.store.config();
        let kind = classify(trade)?;
        debug!(%kind, reserve = %trade.reserve, price = %trade.price, "classified trade");

        match kind {
            TradeKind::Sell => {
                let quote = compute_penalty(trade, config)?;
                let split = distribute_penalty(quote.amount, config);
                let transfers = if quote.amount == 0 {
                    Vec::new()
                } else {
                    vec![
                        Transfer::transfer_from(self.address, trade.recipient, self.address, quote.amount),
                        Transfer::transfer(self.address, config.ecosystem_fund, split.redirected),
                    ]
                };
                Ok(Plan {
                    outcome: IncentiveOutcome::Penalty {
                        charged: quote.amount,
                        kept: split.kept,
                        redirected: split.redirected,
                    },
                    transfers,
                    epoch: None,
                })
            }
            TradeKind::Buy => {
                let mut epoch = self.epoch.clone();
                if epoch.refresh(now) {
                    debug!(epoch_start = now, "epoch rolled over");
                }
                let quote = compute_reward(trade, config, &epoch)?;
                epoch.commit(quote.granted);
                let transfers = if quote.granted == 0 {
                    Vec::new()
                } else {
                    vec![Transfer::transfer(self.address, trade.recipient, quote.granted)]
                };
                Ok(Plan {
                    outcome: IncentiveOutcome::Reward {
                        requested: quote.raw,
                        granted: quote.granted,
                    },
                    transfers,
                    epoch: Some(epoch),
                })
            }
        }
    }

    /// Change the epoch length. Operator only; applies to the current window.
    pub fn set_epoch_duration(&mut self, caller: &Address, secs: u64) -> Result<(), ConfigError> {
        self.store.ensure_operator(caller)?;
        check_duration(secs)?;
        self.epoch.set_duration(secs);
        info!(secs, "epoch duration updated");
        Ok(())
    }

    /// Send `amount` incentive tokens held by the controller to `to`.
    /// Operator only.
    pub fn refund(&mut self, caller: &Address, to: Address, amount: u128) -> Result<(), IncentiveError> {
        self.store.ensure_operator(caller)?;
        self.ledger.execute(&[Transfer::transfer(self.address, to, amount)])?;
        info!(%to, amount = %amount, "refunded incentive tokens");
        Ok(())
    }

    /// Reward budget a buy would see now, accounting for a pending rollover.
    pub fn remaining_reward_budget(&self) -> u128 {
        let mut epoch = self.epoch.clone();
        epoch.refresh(self.clock.now());
        epoch.remaining(self.store.config().reward_per_epoch)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &IncentiveConfig {
        self.store.config()
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.store
    }

    /// Mutable access for the operator setters; each checks the caller itself.
    pub fn config_store_mut(&mut self) -> &mut ConfigStore {
        &mut self.store
    }

    pub fn epoch(&self) -> &EpochBudgetTracker {
        &self.epoch
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }
}

fn check_duration(secs: u64) -> Result<(), ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidParameter {
            field: "epoch_duration_secs",
            reason: "must be nonzero".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use incentive_core::constants::WAD;
    use incentive_core::error::ErrorKind;
    use incentive_core::ledger::MemoryLedger;
    use incentive_core::traits::ManualClock;

    const HOUR: u64 = 3_600;

    fn operator() -> Address {
        Address::from_bytes([1; 20])
    }
    fn fund() -> Address {
        Address::from_bytes([3; 20])
    }
    fn me() -> Address {
        Address::from_bytes([10; 20])
    }
    fn trader() -> Address {
        Address::from_bytes([9; 20])
    }

    fn controller(ledger: MemoryLedger, clock: ManualClock) -> IncentiveController<MemoryLedger, ManualClock> {
        let config = IncentiveConfig::new(Address::from_bytes([2; 20]), fund());
        let store = ConfigStore::new(operator(), config).unwrap();
        IncentiveController::new(me(), store, HOUR, Some(0), ledger, clock).unwrap()
    }

    fn scenario_sell() -> TradeContext {
        TradeContext::sell(1_000_000 * WAD, WAD * 6 / 10, 10_000 * WAD, trader())
    }

    fn scenario_buy() -> TradeContext {
        TradeContext::buy(1_000_000 * WAD, WAD * 6 / 10, 10_000 * WAD, trader())
    }

    fn funded_trader() -> MemoryLedger {
        let mut ledger = MemoryLedger::new();
        ledger.mint(trader(), 1_000 * WAD).unwrap();
        ledger.approve(trader(), me(), u128::MAX);
        ledger
    }

    fn funded_controller() -> MemoryLedger {
        let mut ledger = MemoryLedger::new();
        ledger.mint(me(), 1_000 * WAD).unwrap();
        ledger
    }

    fn boosted(mut c: IncentiveController<MemoryLedger, ManualClock>) -> IncentiveController<MemoryLedger, ManualClock> {
        c.config_store_mut().set_reward_multiplier(&operator(), 1_000_000).unwrap();
        c
    }

    #[test]
    fn sell_charges_and_splits() {
        let mut c = controller(funded_trader(), ManualClock::new(10));
        let outcome = c.conduct_checks(&scenario_sell()).unwrap();
        assert_eq!(
            outcome,
            IncentiveOutcome::Penalty { charged: 320 * WAD, kept: 160 * WAD, redirected: 160 * WAD }
        );
        assert_eq!(c.ledger().balance_of(&trader()), 680 * WAD);
        assert_eq!(c.ledger().balance_of(&me()), 160 * WAD);
        assert_eq!(c.ledger().balance_of(&fund()), 160 * WAD);
    }

    #[test]
    fn sell_without_allowance_changes_nothing() {
        let mut ledger = MemoryLedger::new();
        ledger.mint(trader(), 1_000 * WAD).unwrap();
        let mut c = controller(ledger, ManualClock::new(10));
        let err = c.conduct_checks(&scenario_sell()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(c.ledger().balance_of(&trader()), 1_000 * WAD);
        assert_eq!(c.ledger().balance_of(&fund()), 0);
    }

    #[test]
    fn sell_with_short_balance_changes_nothing() {
        let mut ledger = MemoryLedger::new();
        ledger.mint(trader(), 100 * WAD).unwrap();
        ledger.approve(trader(), me(), u128::MAX);
        let mut c = controller(ledger, ManualClock::new(10));
        assert_eq!(c.conduct_checks(&scenario_sell()).unwrap_err().kind(), ErrorKind::InsufficientFunds);
        assert_eq!(c.ledger().balance_of(&trader()), 100 * WAD);
        assert_eq!(c.ledger().allowance(&trader(), &me()), u128::MAX);
    }

    #[test]
    fn free_sell_needs_no_allowance() {
        let mut c = controller(MemoryLedger::new(), ManualClock::new(10));
        let trade = TradeContext::sell(1_000_000 * WAD, WAD, 10 * WAD, trader());
        assert_eq!(
            c.conduct_checks(&trade).unwrap(),
            IncentiveOutcome::Penalty { charged: 0, kept: 0, redirected: 0 }
        );
    }

    #[test]
    fn buy_pays_and_decays() {
        let mut c = boosted(controller(funded_controller(), ManualClock::new(10)));
        let first = c.conduct_checks(&scenario_buy()).unwrap();
        assert_eq!(first, IncentiveOutcome::Reward { requested: 50 * WAD, granted: 50 * WAD });
        let second = c.conduct_checks(&scenario_buy()).unwrap();
        assert_eq!(second.amount(), 45 * WAD);
        assert_eq!(c.epoch().rewards_paid_this_epoch(), 95 * WAD);
        assert_eq!(c.ledger().balance_of(&trader()), 95 * WAD);
        assert_eq!(c.remaining_reward_budget(), 405 * WAD);
    }

    #[test]
    fn unfunded_reward_leaves_budget_untouched() {
        let mut c = boosted(controller(MemoryLedger::new(), ManualClock::new(10)));
        let err = c.conduct_checks(&scenario_buy()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(c.epoch().rewards_paid_this_epoch(), 0);
    }

    #[test]
    fn rollover_restores_budget() {
        let clock = ManualClock::new(10);
        let mut c = boosted(controller(funded_controller(), clock.clone()));
        c.conduct_checks(&scenario_buy()).unwrap();
        c.conduct_checks(&scenario_buy()).unwrap();

        clock.set(HOUR - 1);
        assert!(c.conduct_checks(&scenario_buy()).unwrap().amount() < 45 * WAD);

        clock.set(HOUR + 5);
        assert_eq!(c.remaining_reward_budget(), 500 * WAD);
        assert_eq!(c.conduct_checks(&scenario_buy()).unwrap().amount(), 50 * WAD);
        assert_eq!(c.epoch().epoch_start_time(), HOUR + 5);
    }

    #[test]
    fn malformed_trade_rejected() {
        let mut c = controller(funded_trader(), ManualClock::new(10));
        let mut trade = scenario_sell();
        trade.amount_out = 1;
        assert_eq!(c.conduct_checks(&trade).unwrap_err().kind(), ErrorKind::MalformedTrade);
        assert_eq!(c.ledger().balance_of(&trader()), 1_000 * WAD);
    }

    #[test]
    fn quote_has_no_effects() {
        let c = boosted(controller(funded_controller(), ManualClock::new(10)));
        assert_eq!(c.quote(&scenario_buy()).unwrap().amount(), 50 * WAD);
        assert_eq!(c.quote(&scenario_buy()).unwrap().amount(), 50 * WAD);
        assert_eq!(c.epoch().rewards_paid_this_epoch(), 0);
        assert_eq!(c.ledger().balance_of(&me()), 1_000 * WAD);
    }

    #[test]
    fn refund_is_operator_only() {
        let mut c = controller(funded_controller(), ManualClock::new(10));
        let err = c.refund(&trader(), trader(), WAD).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        c.refund(&operator(), fund(), 400 * WAD).unwrap();
        assert_eq!(c.ledger().balance_of(&fund()), 400 * WAD);
        assert_eq!(c.ledger().balance_of(&me()), 600 * WAD);

        assert_eq!(c.refund(&operator(), fund(), 601 * WAD).unwrap_err().kind(), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn epoch_duration_checks() {
        let mut c = controller(MemoryLedger::new(), ManualClock::new(10));
        assert!(matches!(c.set_epoch_duration(&trader(), 60), Err(ConfigError::Unauthorized(_))));
        assert!(matches!(c.set_epoch_duration(&operator(), 0), Err(ConfigError::InvalidParameter { .. })));
        c.set_epoch_duration(&operator(), 60).unwrap();
        assert_eq!(c.epoch().epoch_duration_secs(), 60);
    }

    #[test]
    fn deployment_defaults_epoch_start_to_clock() {
        let params = DeploymentParams::new(
            operator(),
            me(),
            Address::from_bytes([4; 20]),
            Address::from_bytes([5; 20]),
            fund(),
            Address::from_bytes([2; 20]),
        );
        let c = IncentiveController::from_deployment(&params, MemoryLedger::new(), ManualClock::new(777)).unwrap();
        assert_eq!(c.epoch().epoch_start_time(), 777);
        assert_eq!(c.address(), me());
        assert_eq!(c.config_store().operator(), operator());
    }

    #[test]
    fn zero_duration_rejected_at_construction() {
        let store = ConfigStore::new(operator(), IncentiveConfig::new(Address::from_bytes([2; 20]), fund())).unwrap();
        assert!(IncentiveController::new(me(), store, 0, None, MemoryLedger::new(), ManualClock::new(0)).is_err());
    }
}
