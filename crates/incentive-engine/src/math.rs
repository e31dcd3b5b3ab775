//! Fixed-point helpers shared by the engines.
//!
//! Prices and fractions are WAD-scaled (`10^18` = 1.0). Products go through
//! 256-bit intermediates so `amount * WAD` never overflows; only results
//! that do not fit `u128` are reported.

use ethnum::U256;
use incentive_core::constants::WAD;
use incentive_core::error::TradeError;

/// `a * b / denominator`, truncating.
///
/// Fails with [`TradeError::ArithmeticOverflow`] if `denominator` is zero or
/// the quotient does not fit in `u128`.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, TradeError> {
    if denominator == 0 {
        return Err(TradeError::ArithmeticOverflow);
    }
    let q = U256::from(a) * U256::from(b) / U256::from(denominator);
    if q > U256::from(u128::MAX) {
        return Err(TradeError::ArithmeticOverflow);
    }
    Ok(q.as_u128())
}

/// How far `price` sits below `target`, as a WAD fraction of `target`.
///
/// Zero when the price is at or above target. `target` must be nonzero.
pub fn deviation_below(price: u128, target: u128) -> Result<u128, TradeError> {
    if price >= target {
        return Ok(0);
    }
    mul_div(target - price, WAD, target)
}

/// Spot price after `amount_in` protocol tokens are added to a
/// constant-product pool holding `reserve` of them.
///
/// `p' = p * r^2 / (r + amount_in)^2`
pub fn price_after_sell(price: u128, reserve: u128, amount_in: u128) -> Result<u128, TradeError> {
    if reserve == 0 {
        return Err(TradeError::EmptyReserve);
    }
    let new_reserve = reserve
        .checked_add(amount_in)
        .ok_or(TradeError::ArithmeticOverflow)?;
    let p = mul_div(price, reserve, new_reserve)?;
    mul_div(p, reserve, new_reserve)
}

/// Spot price after `amount_out` protocol tokens are removed from a
/// constant-product pool holding `reserve` of them.
///
/// `p' = p * r^2 / (r - amount_out)^2`
pub fn price_after_buy(price: u128, reserve: u128, amount_out: u128) -> Result<u128, TradeError> {
    if reserve == 0 {
        return Err(TradeError::EmptyReserve);
    }
    if amount_out >= reserve {
        return Err(TradeError::ReserveExhausted { reserve, amount_out });
    }
    let new_reserve = reserve - amount_out;
    let p = mul_div(price, reserve, new_reserve)?;
    mul_div(p, reserve, new_reserve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mul_div_handles_wide_products() {
        // 10^24 * 10^18 overflows u128 but the quotient does not.
        assert_eq!(mul_div(1_000_000 * WAD, WAD, WAD).unwrap(), 1_000_000 * WAD);
        assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX).unwrap(), u128::MAX);
    }

    #[test]
    fn mul_div_truncates() {
        assert_eq!(mul_div(10, 1, 3).unwrap(), 3);
        assert_eq!(mul_div(2, 1, 3).unwrap(), 0);
    }

    #[test]
    fn mul_div_overflow_and_zero_denominator() {
        assert_eq!(mul_div(u128::MAX, 2, 1), Err(TradeError::ArithmeticOverflow));
        assert_eq!(mul_div(1, 1, 0), Err(TradeError::ArithmeticOverflow));
    }

    #[test]
    fn deviation_values() {
        assert_eq!(deviation_below(WAD * 6 / 10, WAD).unwrap(), WAD * 4 / 10);
        assert_eq!(deviation_below(WAD * 9 / 10, WAD).unwrap(), WAD / 10);
        assert_eq!(deviation_below(WAD, WAD).unwrap(), 0);
        assert_eq!(deviation_below(2 * WAD, WAD).unwrap(), 0);
        assert_eq!(deviation_below(0, WAD).unwrap(), WAD);
    }

    #[test]
    fn sell_lowers_price() {
        let reserve = 1_000_000 * WAD;
        let p = price_after_sell(WAD * 6 / 10, reserve, 10_000 * WAD).unwrap();
        // 0.6 / 1.01^2 = 0.588177...
        assert!(p > 588_000_000_000_000_000 && p < 588_200_000_000_000_000, "{p}");
    }

    #[test]
    fn buy_raises_price() {
        let reserve = 1_000_000 * WAD;
        let p = price_after_buy(WAD * 6 / 10, reserve, 10_000 * WAD).unwrap();
        // 0.6 / 0.99^2 = 0.612182...
        assert!(p > 612_100_000_000_000_000 && p < 612_200_000_000_000_000, "{p}");
    }

    #[test]
    fn buy_cannot_drain_reserve() {
        assert_eq!(
            price_after_buy(WAD, 100, 100),
            Err(TradeError::ReserveExhausted { reserve: 100, amount_out: 100 })
        );
        assert_eq!(price_after_buy(WAD, 0, 0), Err(TradeError::EmptyReserve));
        assert_eq!(price_after_sell(WAD, 0, 1), Err(TradeError::EmptyReserve));
    }

    proptest! {
        #[test]
        fn deviation_bounded_by_one(price in any::<u64>(), target in 1u64..) {
            let d = deviation_below(price as u128 * 1_000, target as u128 * 1_000).unwrap();
            prop_assert!(d <= WAD);
        }

        #[test]
        fn sell_never_raises_price(
            price in 1u128..10 * WAD,
            reserve in 1u128..1_000_000_000 * WAD,
            amount in 0u128..1_000_000_000 * WAD,
        ) {
            prop_assert!(price_after_sell(price, reserve, amount).unwrap() <= price);
        }
    }
}
