//! Buy-side reward computation.
//!
//! A buy of `amount_out` protocol tokens earns the slice of the epoch budget
//! that its volume represents of the expected epoch volume, weighted by how
//! far the price sits below the reward target and by the multiplier. Only
//! the part of the move that stays at or below the target is paid for.
//!
//! The result then decays with the budget already spent this epoch
//! (`raw * remaining / reward_per_epoch`) and is finally clamped to the
//! remaining budget, so repeated buys in one window earn less and less and
//! nothing once the budget is gone.

use incentive_core::config::IncentiveConfig;
use incentive_core::constants::{MULTIPLIER_PRECISION, WAD};
use incentive_core::error::TradeError;
use incentive_core::types::TradeContext;
use serde::{Deserialize, Serialize};

use crate::epoch::EpochBudgetTracker;
use crate::math::{deviation_below, mul_div, price_after_buy};

/// Breakdown of a reward. Fractions are WAD-scaled.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct RewardQuote {
    /// Deviation below the reward target before the trade.
    pub deviation: u128,
    /// Share of the price move that ends at or below the target.
    pub toward_peg: u128,
    /// Reward before the epoch budget is consulted.
    pub raw: u128,
    /// Reward after decay by the budget already spent.
    pub decayed: u128,
    /// Reward after clamping to the remaining budget; what gets paid.
    pub granted: u128,
}

/// Compute the reward for a buy of `trade.amount_out` protocol tokens.
///
/// `budget` must already be refreshed to the current time; it is only read.
///
/// # Errors
///
/// - [`TradeError::ZeroPrice`] / [`TradeError::EmptyReserve`] for unusable
///   pair readings
/// - [`TradeError::ReserveExhausted`] if the buy would empty the pool
/// - [`TradeError::ArithmeticOverflow`] if an intermediate does not fit `u128`
pub fn compute_reward(
    trade: &TradeContext,
    config: &IncentiveConfig,
    budget: &EpochBudgetTracker,
) -> Result<RewardQuote, TradeError> {
    if trade.price == 0 {
        return Err(TradeError::ZeroPrice);
    }
    if trade.reserve == 0 {
        return Err(TradeError::EmptyReserve);
    }
    if trade.amount_out >= trade.reserve {
        return Err(TradeError::ReserveExhausted {
            reserve: trade.reserve,
            amount_out: trade.amount_out,
        });
    }
    let target = config.reward_target_price;

    let deviation = deviation_below(trade.price, target)?;
    if deviation == 0 || config.reward_per_epoch == 0 {
        return Ok(RewardQuote { deviation, ..RewardQuote::default() });
    }

    // A post-trade price beyond u128 is far past any target.
    let post_price = match price_after_buy(trade.price, trade.reserve, trade.amount_out) {
        Err(TradeError::ArithmeticOverflow) => u128::MAX,
        other => other?,
    };

    let toward_peg = if post_price <= target {
        WAD
    } else {
        // price < target < post_price here.
        mul_div(target - trade.price, WAD, post_price - trade.price)?
    };

    let budget_share = mul_div(
        trade.amount_out,
        config.reward_per_epoch,
        config.expected_volume_per_epoch,
    )?;
    let weighted = mul_div(budget_share, deviation, WAD)?;
    let weighted = mul_div(weighted, toward_peg, WAD)?;
    let raw = mul_div(
        weighted,
        config.reward_multiplier as u128,
        MULTIPLIER_PRECISION as u128,
    )?;

    let remaining = budget.remaining(config.reward_per_epoch);
    let decayed = mul_div(raw, remaining, config.reward_per_epoch)?;
    let granted = budget.reserve_reward_budget(decayed, config.reward_per_epoch);

    Ok(RewardQuote {
        deviation,
        toward_peg,
        raw,
        decayed,
        granted,
    })
}
