//! Sell-side penalty computation.
//!
//! Pure computation: no ledger, no clock. The penalty is charged in
//! incentive tokens.
//!
//! ```text
//! spot        = deviation_below(price, target)
//! impact      = deviation_below(price_after_sell, target) - spot
//! surcharge   = max(0, impact - FREE_IMPACT)
//! base        = amount_in * (spot + surcharge)
//! penalty     = base * PENALTY_RATE * multiplier * incentive_token_rate
//! ```
//!
//! A sell at 0.60 against a 1.00 target pays 8% of 40% of its volume at a
//! 1.0× multiplier; a sell whose own impact moves the price by more than 2%
//! of the target also pays on the excess.

use incentive_core::config::IncentiveConfig;
use incentive_core::constants::{
    BPS_PRECISION, FREE_IMPACT_BPS, MULTIPLIER_PRECISION, PENALTY_RATE_BPS, WAD,
};
use incentive_core::error::TradeError;
use incentive_core::types::TradeContext;
use serde::{Deserialize, Serialize};

use crate::math::{deviation_below, mul_div, price_after_sell};

/// Free price impact as a WAD fraction of the target price.
const FREE_IMPACT_WAD: u128 = WAD / BPS_PRECISION * FREE_IMPACT_BPS;

/// Breakdown of a penalty. Deviations are WAD fractions of the target.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct PenaltyQuote {
    /// Deviation below target before the trade.
    pub spot_deviation: u128,
    /// Price impact beyond the free allowance, added to the deviation.
    pub impact_surcharge: u128,
    /// Penalty measured in protocol tokens.
    pub protocol_amount: u128,
    /// Penalty in incentive tokens; what the trader is charged.
    pub amount: u128,
}

/// Compute the penalty for a sell of `trade.amount_in` protocol tokens.
///
/// # Errors
///
/// - [`TradeError::ZeroPrice`] / [`TradeError::EmptyReserve`] for unusable
///   pair readings
/// - [`TradeError::ArithmeticOverflow`] if the penalty does not fit `u128`
pub fn compute_penalty(trade: &TradeContext, config: &IncentiveConfig) -> Result<PenaltyQuote, TradeError> {
    if trade.price == 0 {
        return Err(TradeError::ZeroPrice);
    }
    let target = config.penalty_target_price;

    let spot_deviation = deviation_below(trade.price, target)?;
    let post_price = price_after_sell(trade.price, trade.reserve, trade.amount_in)?;
    let post_deviation = deviation_below(post_price, target)?;

    let impact = post_deviation.saturating_sub(spot_deviation);
    let impact_surcharge = impact.saturating_sub(FREE_IMPACT_WAD);
    let effective = spot_deviation + impact_surcharge;

    let base = mul_div(trade.amount_in, effective, WAD)?;
    let protocol_amount = mul_div(
        base,
        PENALTY_RATE_BPS * config.penalty_multiplier as u128,
        BPS_PRECISION * MULTIPLIER_PRECISION as u128,
    )?;
    let amount = mul_div(protocol_amount, config.incentive_token_rate, WAD)?;

    Ok(PenaltyQuote {
        spot_deviation,
        impact_surcharge,
        protocol_amount,
        amount,
    })
}
