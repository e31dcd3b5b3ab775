//! Penalty split between the controller and the ecosystem fund.

use incentive_core::config::IncentiveConfig;
use incentive_core::constants::PERCENT_PRECISION;
use serde::{Deserialize, Serialize};

/// How a charged penalty is divided. `kept + redirected` is always the
/// charged amount.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PenaltySplit {
    /// Stays with the controller.
    pub kept: u128,
    /// Forwarded to the ecosystem fund.
    pub redirected: u128,
}

/// Split `amount` according to the configured redirect percentage.
///
/// The redirected share truncates; the kept share absorbs the remainder.
pub fn distribute_penalty(amount: u128, config: &IncentiveConfig) -> PenaltySplit {
    let pct = PERCENT_PRECISION as u128;
    let redirect = config.penalty_redirect_percent as u128;
    // floor(amount * redirect / 100) without the u128 product.
    let redirected = amount / pct * redirect + amount % pct * redirect / pct;
    PenaltySplit {
        kept: amount - redirected,
        redirected,
    }
}
