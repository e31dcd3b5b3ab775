//! Trade direction classification.

use incentive_core::error::TradeError;
use incentive_core::types::{TradeContext, TradeKind};

/// Label a trade as a sell or a buy of the protocol token.
///
/// | `amount_in` | `amount_out` | Result |
/// |-------------|--------------|--------|
/// | > 0         | 0            | Sell   |
/// | 0           | > 0          | Buy    |
/// | > 0         | > 0          | error  |
/// | 0           | 0            | error  |
///
/// # Errors
///
/// [`TradeError::MalformedTrade`] when both or neither amount is nonzero.
pub fn classify(trade: &TradeContext) -> Result<TradeKind, TradeError> {
    match (trade.amount_in > 0, trade.amount_out > 0) {
        (true, false) => Ok(TradeKind::Sell),
        (false, true) => Ok(TradeKind::Buy),
        _ => Err(TradeError::MalformedTrade {
            amount_in: trade.amount_in,
            amount_out: trade.amount_out,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use incentive_core::types::Address;

    fn trade(amount_in: u128, amount_out: u128) -> TradeContext {
        TradeContext {
            reserve: 1_000,
            price: 1,
            amount_out,
            amount_in,
            recipient: Address::from_bytes([1; 20]),
        }
    }

    #[test]
    fn amount_in_is_sell() {
        assert_eq!(classify(&trade(5, 0)).unwrap(), TradeKind::Sell);
    }

    #[test]
    fn amount_out_is_buy() {
        assert_eq!(classify(&trade(0, 5)).unwrap(), TradeKind::Buy);
    }

    #[test]
    fn both_sides_rejected() {
        assert_eq!(
            classify(&trade(5, 7)),
            Err(TradeError::MalformedTrade { amount_in: 5, amount_out: 7 })
        );
    }

    #[test]
    fn empty_trade_rejected() {
        assert_eq!(
            classify(&trade(0, 0)),
            Err(TradeError::MalformedTrade { amount_in: 0, amount_out: 0 })
        );
    }
}
