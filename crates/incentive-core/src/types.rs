//! Core data types: accounts, trades, transfers, and decisions.
//!
//! All token amounts and prices are `u128` with 18 decimals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amount::base_units;

/// A 20-byte account identifier.
///
/// Displayed and parsed as `0x`-prefixed lowercase hex. Serialized the same
/// way so deployment files can carry addresses verbatim.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address. Never valid as a configured account.
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| format!("invalid address {s:?}: {e}"))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| format!("invalid address {s:?}: {} bytes, expected 20", b.len()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.to_string()
    }
}

/// One swap as reported by the pair.
///
/// `reserve` and `price` are the pair's readings for the protocol token at
/// the time of the swap. Exactly one of `amount_in` / `amount_out` is nonzero
/// in a well-formed trade.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TradeContext {
    /// Protocol-token reserve held by the pair.
    #[serde(with = "base_units")]
    pub reserve: u128,
    /// Price of the protocol token in quote units.
    #[serde(with = "base_units")]
    pub price: u128,
    /// Protocol tokens removed from the pool (a buy).
    #[serde(default, with = "base_units")]
    pub amount_out: u128,
    /// Protocol tokens supplied to the pool (a sell).
    #[serde(default, with = "base_units")]
    pub amount_in: u128,
    /// The trader: pays penalties, receives rewards.
    pub recipient: Address,
}

impl TradeContext {
    pub fn sell(reserve: u128, price: u128, amount_in: u128, recipient: Address) -> Self {
        Self { reserve, price, amount_out: 0, amount_in, recipient }
    }

    pub fn buy(reserve: u128, price: u128, amount_out: u128, recipient: Address) -> Self {
        Self { reserve, price, amount_out, amount_in: 0, recipient }
    }
}

/// Direction of a trade relative to the protocol token.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    /// Protocol token supplied to the pool; price pushed down.
    Sell,
    /// Protocol token removed from the pool; price pushed up.
    Buy,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sell => f.write_str("sell"),
            Self::Buy => f.write_str("buy"),
        }
    }
}

/// A single incentive-token movement.
///
/// `spender: Some(s)` is an allowance-based `transfer_from` executed by `s`;
/// `None` is a plain `transfer` by `from` itself.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    #[serde(with = "base_units")]
    pub amount: u128,
    pub spender: Option<Address>,
}

impl Transfer {
    pub fn transfer(from: Address, to: Address, amount: u128) -> Self {
        Self { from, to, amount, spender: None }
    }

    pub fn transfer_from(spender: Address, from: Address, to: Address, amount: u128) -> Self {
        Self { from, to, amount, spender: Some(spender) }
    }
}

/// The decision reached for one trade.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "path", rename_all = "lowercase")]
pub enum IncentiveOutcome {
    /// Sell path: `charged` pulled from the trader, of which `redirected`
    /// went to the ecosystem fund and `kept` stayed with the controller.
    Penalty {
        #[serde(with = "base_units")]
        charged: u128,
        #[serde(with = "base_units")]
        kept: u128,
        #[serde(with = "base_units")]
        redirected: u128,
    },
    /// Buy path: `requested` is the reward before the epoch budget was
    /// applied, `granted` what the trader actually received.
    Reward {
        #[serde(with = "base_units")]
        requested: u128,
        #[serde(with = "base_units")]
        granted: u128,
    },
}

impl IncentiveOutcome {
    pub fn kind(&self) -> TradeKind {
        match self {
            Self::Penalty { .. } => TradeKind::Sell,
            Self::Reward { .. } => TradeKind::Buy,
        }
    }

    /// Incentive tokens moved by this decision (penalty charged or reward paid).
    pub fn amount(&self) -> u128 {
        match self {
            Self::Penalty { charged, .. } => *charged,
            Self::Reward { granted, .. } => *granted,
        }
    }
}
