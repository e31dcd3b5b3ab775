//! Protocol constants. All token amounts and prices are 18-decimal fixed point
//! (1 token = [`WAD`] base units).

/// One whole token (or a price of exactly 1.0) in base units.
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Denominator for penalty and reward multipliers: 100,000 = 1.0×.
pub const MULTIPLIER_PRECISION: u64 = 100_000;

/// Denominator for the penalty keep/redirect split.
pub const PERCENT_PRECISION: u8 = 100;

pub const BPS_PRECISION: u128 = 10_000;

/// Share of the deviation-weighted sell volume charged as a penalty at a 1.0×
/// multiplier, in basis points (8%).
///
/// At this rate, selling 10,000 tokens at a spot
/// price of 0.60 against a 1.00 target costs `10_000 * 0.40 * 0.08 = 320`.
pub const PENALTY_RATE_BPS: u128 = 800;

/// Price impact a single sell may cause, as a fraction of the target price in
/// basis points, before the impact itself is added to the penalised deviation.
pub const FREE_IMPACT_BPS: u128 = 200;

/// Default penalty and reward target price (1.0).
pub const DEFAULT_TARGET_PRICE: u128 = WAD;

/// Default conversion rate from protocol tokens to incentive tokens (1.0).
pub const DEFAULT_INCENTIVE_TOKEN_RATE: u128 = WAD;

/// Largest accepted penalty or reward multiplier (100×).
pub const MAX_MULTIPLIER: u64 = 100 * MULTIPLIER_PRECISION;

/// Default penalty multiplier (1.0×).
pub const DEFAULT_PENALTY_MULTIPLIER: u64 = MULTIPLIER_PRECISION;

/// Default reward multiplier (1.0×).
pub const DEFAULT_REWARD_MULTIPLIER: u64 = MULTIPLIER_PRECISION;

/// Default incentive-token reward budget per epoch (500 tokens).
pub const DEFAULT_REWARD_PER_EPOCH: u128 = 500 * WAD;

/// Default expected protocol-token buy volume per epoch (400,000 tokens).
pub const DEFAULT_EXPECTED_VOLUME_PER_EPOCH: u128 = 400_000 * WAD;

/// Default epoch length: 12 hours.
pub const DEFAULT_EPOCH_DURATION_SECS: u64 = 12 * 60 * 60;

pub const DEFAULT_PENALTY_KEEP_PERCENT: u8 = 50;
pub const DEFAULT_PENALTY_REDIRECT_PERCENT: u8 = 50;

/// Environment variable prefix for deployment overrides (`INCENTIVE_*`).
pub const ENV_PREFIX: &str = "INCENTIVE";
