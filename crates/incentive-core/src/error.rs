//! Error types for the incentive controller.
use thiserror::Error;

use crate::types::Address;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unauthorized caller: {0}")] Unauthorized(Address),
    #[error("invalid parameter {field}: {reason}")] InvalidParameter { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { field, reason: reason.into() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    #[error("malformed trade: amount_in {amount_in}, amount_out {amount_out}")] MalformedTrade { amount_in: u128, amount_out: u128 },
    #[error("empty reserve")] EmptyReserve,
    #[error("zero price")] ZeroPrice,
    #[error("amount_out {amount_out} drains reserve {reserve}")] ReserveExhausted { reserve: u128, amount_out: u128 },
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds in {account}: have {have}, need {need}")] InsufficientFunds { account: Address, have: u128, need: u128 },
    #[error("insufficient allowance from {owner} to {spender}: have {have}, need {need}")] InsufficientAllowance { owner: Address, spender: Address, have: u128, need: u128 },
    #[error("balance overflow in {0}")] BalanceOverflow(Address),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount")] Empty,
    #[error("amount has no digits")] NoDigits,
    #[error("invalid character: {0}")] InvalidCharacter(char),
    #[error("too many decimal places: {0} > 18")] TooManyDecimals(usize),
    #[error("amount overflows u128")] Overflow,
}

/// Failure to load deployment parameters.
#[derive(Error, Debug)]
pub enum DeploymentError {
    #[error("load: {0}")] Load(#[from] ::config::ConfigError),
    #[error(transparent)] Invalid(#[from] ConfigError),
}

/// Coarse classification of every failure a controller call can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    InvalidParameter,
    MalformedTrade,
    InsufficientFunds,
    ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncentiveError {
    #[error(transparent)] Config(#[from] ConfigError),
    #[error(transparent)] Trade(#[from] TradeError),
    #[error(transparent)] Ledger(#[from] LedgerError),
}

impl IncentiveError {
    /// Map this error onto the controller's error taxonomy.
    ///
    /// A missing allowance counts as insufficient funds: from the caller's
    /// side both mean the trader could not cover the penalty.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(ConfigError::Unauthorized(_)) => ErrorKind::Unauthorized,
            Self::Config(ConfigError::InvalidParameter { .. }) => ErrorKind::InvalidParameter,
            Self::Trade(TradeError::ArithmeticOverflow) => ErrorKind::ArithmeticOverflow,
            Self::Trade(_) => ErrorKind::MalformedTrade,
            Self::Ledger(LedgerError::BalanceOverflow(_)) => ErrorKind::ArithmeticOverflow,
            Self::Ledger(_) => ErrorKind::InsufficientFunds,
        }
    }
}
