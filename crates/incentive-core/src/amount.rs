//! Fixed-point amount parsing, formatting, and serde helpers.
//!
//! Amounts are `u128` base units with 18 decimals. Deployment and trade
//! files carry them as decimal strings of base units
//! (`"500000000000000000000"` = 500 tokens) because TOML and most JSON
//! tooling cannot represent integers above `u64::MAX`.

use crate::constants::WAD;
use crate::error::AmountError;

const DECIMALS: usize = 18;

/// Parse a human-readable token quantity (`"10000"`, `"0.60"`, `"1_000.5"`)
/// into 18-decimal base units.
///
/// # Examples
///
/// ```
/// use incentive_core::amount::parse_units;
/// use incentive_core::constants::WAD;
///
/// assert_eq!(parse_units("1").unwrap(), WAD);
/// assert_eq!(parse_units("0.60").unwrap(), 600_000_000_000_000_000);
/// assert_eq!(parse_units("10_000").unwrap(), 10_000 * WAD);
/// ```
pub fn parse_units(s: &str) -> Result<u128, AmountError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (s, None),
    };
    let frac_digits: String = frac.unwrap_or("").chars().filter(|c| *c != '_').collect();
    if frac_digits.len() > DECIMALS {
        return Err(AmountError::TooManyDecimals(frac_digits.len()));
    }

    let whole_value = parse_digits(whole)?;
    let frac_value = parse_digits(&frac_digits)?;
    // A point needs digits after it; without one the whole part needs them.
    let digits = match frac {
        Some(_) => frac_digits.as_str(),
        None => whole,
    };
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return Err(AmountError::NoDigits);
    }
    let frac_scale = 10u128.pow((DECIMALS - frac_digits.len()) as u32);

    whole_value
        .checked_mul(WAD)
        .and_then(|w| w.checked_add(frac_value * frac_scale))
        .ok_or(AmountError::Overflow)
}

/// Format base units as a token quantity, trimming trailing zeros.
///
/// # Examples
///
/// ```
/// use incentive_core::amount::format_units;
///
/// assert_eq!(format_units(320_000_000_000_000_000_000), "320");
/// assert_eq!(format_units(600_000_000_000_000_000), "0.6");
/// assert_eq!(format_units(0), "0");
/// ```
pub fn format_units(value: u128) -> String {
    let whole = value / WAD;
    let frac = value % WAD;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:018}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

fn parse_digits(s: &str) -> Result<u128, AmountError> {
    let mut value: u128 = 0;
    for c in s.chars() {
        if c == '_' {
            continue;
        }
        let digit = c.to_digit(10).ok_or(AmountError::InvalidCharacter(c))?;
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit as u128))
            .ok_or(AmountError::Overflow)?;
    }
    Ok(value)
}

/// Serde adapter storing a `u128` as a decimal string of base units.
///
/// Deserialization also accepts plain integers for small values.
pub mod base_units {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(value: &u128, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(d: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_any(BaseUnitsVisitor)
    }

    struct BaseUnitsVisitor;

    impl Visitor<'_> for BaseUnitsVisitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a base-unit amount as a decimal string or integer")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(v as u128)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
            u128::try_from(v).map_err(|_| E::custom("negative amount"))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
            v.trim()
                .replace('_', "")
                .parse::<u128>()
                .map_err(|e| E::custom(format!("invalid amount {v:?}: {e}")))
        }
    }

    /// Same as the parent module for `Option<u128>` fields.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<u128>, s: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(v) => s.serialize_some(&v.to_string()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(d: D) -> Result<Option<u128>, D::Error>
        where
            D: Deserializer<'de>,
        {
            #[derive(Deserialize)]
            struct Wrapper(#[serde(with = "super")] u128);

            Ok(Option::<Wrapper>::deserialize(d)?.map(|Wrapper(v)| v))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Holder {
        #[serde(with = "base_units")]
        amount: u128,
        #[serde(default, with = "base_units::option")]
        maybe: Option<u128>,
    }

    #[test]
    fn parse_whole_and_fraction() {
        assert_eq!(parse_units("0.9").unwrap(), 900_000_000_000_000_000);
        assert_eq!(parse_units("100000000").unwrap(), 100_000_000 * WAD);
        assert_eq!(parse_units(".5").unwrap(), WAD / 2);
        assert_eq!(parse_units("0.000000000000000001").unwrap(), 1);
    }

    #[test]
    fn parse_requires_digits() {
        assert_eq!(parse_units("."), Err(AmountError::NoDigits));
        assert_eq!(parse_units("_"), Err(AmountError::NoDigits));
        assert_eq!(parse_units("1."), Err(AmountError::NoDigits));
        assert_eq!(parse_units("1._"), Err(AmountError::NoDigits));
        assert_eq!(parse_units("_1"), Ok(WAD));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_units(""), Err(AmountError::Empty));
        assert_eq!(parse_units("1a"), Err(AmountError::InvalidCharacter('a')));
        assert_eq!(parse_units("-1"), Err(AmountError::InvalidCharacter('-')));
        assert_eq!(parse_units("1.2.3"), Err(AmountError::InvalidCharacter('.')));
        assert_eq!(
            parse_units("0.0000000000000000001"),
            Err(AmountError::TooManyDecimals(19))
        );
        assert_eq!(
            parse_units("1000000000000000000000000000000000000000"),
            Err(AmountError::Overflow)
        );
    }

    #[test]
    fn base_units_serialize_as_string() {
        let h = Holder { amount: 500 * WAD, maybe: None };
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, r#"{"amount":"500000000000000000000","maybe":null}"#);
    }

    #[test]
    fn base_units_accept_integers_and_strings() {
        let h: Holder = serde_json::from_str(r#"{"amount":42,"maybe":"7"}"#).unwrap();
        assert_eq!(h, Holder { amount: 42, maybe: Some(7) });
        let h: Holder = serde_json::from_str(r#"{"amount":"1_000"}"#).unwrap();
        assert_eq!(h, Holder { amount: 1000, maybe: None });
    }

    #[test]
    fn base_units_reject_negative() {
        assert!(serde_json::from_str::<Holder>(r#"{"amount":-1}"#).is_err());
    }

    proptest! {
        #[test]
        fn format_then_parse_is_identity(v in any::<u64>(), frac in 0u128..WAD) {
            let value = (v as u128) * WAD + frac;
            prop_assert_eq!(parse_units(&format_units(value)).unwrap(), value);
        }
    }
}
