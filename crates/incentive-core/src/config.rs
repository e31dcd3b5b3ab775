//! Operator-tunable controller configuration.
//!
//! [`IncentiveConfig`] is plain data. [`ConfigStore`] owns it together with
//! the operator identity and is the only way to change it: every setter
//! checks the caller and validates the new value before storing it.
//! [`DeploymentParams`] is the construction-time input, loadable from a
//! TOML/JSON/YAML file with `INCENTIVE_*` environment overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::amount::base_units;
use crate::constants::{
    DEFAULT_EPOCH_DURATION_SECS, DEFAULT_EXPECTED_VOLUME_PER_EPOCH, DEFAULT_INCENTIVE_TOKEN_RATE,
    DEFAULT_PENALTY_KEEP_PERCENT, DEFAULT_PENALTY_MULTIPLIER, DEFAULT_PENALTY_REDIRECT_PERCENT,
    DEFAULT_REWARD_MULTIPLIER, DEFAULT_REWARD_PER_EPOCH, DEFAULT_TARGET_PRICE, ENV_PREFIX,
    MAX_MULTIPLIER, PERCENT_PRECISION,
};
use crate::error::{ConfigError, DeploymentError};
use crate::types::Address;

/// Parameters consulted by the engines on every trade.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct IncentiveConfig {
    /// Peg used as the deviation reference for sells.
    #[serde(with = "base_units")]
    pub penalty_target_price: u128,
    /// Peg used as the deviation reference for buys.
    #[serde(with = "base_units")]
    pub reward_target_price: u128,
    /// Parts-per-100000 scaling of the penalty.
    pub penalty_multiplier: u64,
    /// Parts-per-100000 scaling of the reward.
    pub reward_multiplier: u64,
    /// Buy volume (protocol tokens) the reward budget is spread across.
    #[serde(with = "base_units")]
    pub expected_volume_per_epoch: u128,
    pub penalty_keep_percent: u8,
    pub penalty_redirect_percent: u8,
    pub incentive_token: Address,
    pub ecosystem_fund: Address,
    /// Incentive-token reward ceiling per epoch.
    #[serde(with = "base_units")]
    pub reward_per_epoch: u128,
    /// Price of one protocol token in incentive tokens.
    #[serde(with = "base_units")]
    pub incentive_token_rate: u128,
}

impl IncentiveConfig {
    /// A configuration with every tunable at its default.
    pub fn new(incentive_token: Address, ecosystem_fund: Address) -> Self {
        Self {
            penalty_target_price: DEFAULT_TARGET_PRICE,
            reward_target_price: DEFAULT_TARGET_PRICE,
            penalty_multiplier: DEFAULT_PENALTY_MULTIPLIER,
            reward_multiplier: DEFAULT_REWARD_MULTIPLIER,
            expected_volume_per_epoch: DEFAULT_EXPECTED_VOLUME_PER_EPOCH,
            penalty_keep_percent: DEFAULT_PENALTY_KEEP_PERCENT,
            penalty_redirect_percent: DEFAULT_PENALTY_REDIRECT_PERCENT,
            incentive_token,
            ecosystem_fund,
            reward_per_epoch: DEFAULT_REWARD_PER_EPOCH,
            incentive_token_rate: DEFAULT_INCENTIVE_TOKEN_RATE,
        }
    }

    /// Check every field invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_nonzero_price("penalty_target_price", self.penalty_target_price)?;
        check_nonzero_price("reward_target_price", self.reward_target_price)?;
        check_multiplier("penalty_multiplier", self.penalty_multiplier)?;
        check_multiplier("reward_multiplier", self.reward_multiplier)?;
        check_nonzero_amount("expected_volume_per_epoch", self.expected_volume_per_epoch)?;
        check_split(self.penalty_keep_percent, self.penalty_redirect_percent)?;
        check_address("incentive_token", &self.incentive_token)?;
        check_address("ecosystem_fund", &self.ecosystem_fund)?;
        check_nonzero_amount("incentive_token_rate", self.incentive_token_rate)?;
        Ok(())
    }
}

fn check_nonzero_price(field: &'static str, value: u128) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "target price must be nonzero"));
    }
    Ok(())
}

fn check_nonzero_amount(field: &'static str, value: u128) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be nonzero"));
    }
    Ok(())
}

fn check_multiplier(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value > MAX_MULTIPLIER {
        return Err(ConfigError::invalid(
            field,
            format!("{value} exceeds maximum {MAX_MULTIPLIER}"),
        ));
    }
    Ok(())
}

fn check_split(keep: u8, redirect: u8) -> Result<(), ConfigError> {
    if keep as u16 + redirect as u16 != PERCENT_PRECISION as u16 {
        return Err(ConfigError::invalid(
            "penalty_split",
            format!("keep {keep} + redirect {redirect} != {PERCENT_PRECISION}"),
        ));
    }
    Ok(())
}

fn check_address(field: &'static str, address: &Address) -> Result<(), ConfigError> {
    if address.is_zero() {
        return Err(ConfigError::invalid(field, "zero address"));
    }
    Ok(())
}

/// The configuration together with the identity allowed to change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    operator: Address,
    config: IncentiveConfig,
}

impl ConfigStore {
    /// Validate `config` and take ownership of it.
    pub fn new(operator: Address, config: IncentiveConfig) -> Result<Self, ConfigError> {
        check_address("operator", &operator)?;
        config.validate()?;
        Ok(Self { operator, config })
    }

    pub fn operator(&self) -> Address {
        self.operator
    }

    pub fn config(&self) -> &IncentiveConfig {
        &self.config
    }

    /// Fail with [`ConfigError::Unauthorized`] unless `caller` is the operator.
    pub fn ensure_operator(&self, caller: &Address) -> Result<(), ConfigError> {
        if *caller != self.operator {
            return Err(ConfigError::Unauthorized(*caller));
        }
        Ok(())
    }

    /// Hand the operator role to `new_operator`.
    pub fn transfer_operator(&mut self, caller: &Address, new_operator: Address) -> Result<(), ConfigError> {
        self.ensure_operator(caller)?;
        check_address("operator", &new_operator)?;
        info!(from = %self.operator, to = %new_operator, "operator transferred");
        self.operator = new_operator;
        Ok(())
    }

    pub fn set_penalty_target_price(&mut self, caller: &Address, price: u128) -> Result<(), ConfigError> {
        self.ensure_operator(caller)?;
        check_nonzero_price("penalty_target_price", price)?;
        self.config.penalty_target_price = price;
        info!(price = %price, "penalty target price updated");
        Ok(())
    }

    pub fn set_reward_target_price(&mut self, caller: &Address, price: u128) -> Result<(), ConfigError> {
        self.ensure_operator(caller)?;
        check_nonzero_price("reward_target_price", price)?;
        self.config.reward_target_price = price;
        info!(price = %price, "reward target price updated");
        Ok(())
    }

    pub fn set_penalty_multiplier(&mut self, caller: &Address, multiplier: u64) -> Result<(), ConfigError> {
        self.ensure_operator(caller)?;
        check_multiplier("penalty_multiplier", multiplier)?;
        self.config.penalty_multiplier = multiplier;
        info!(multiplier, "penalty multiplier updated");
        Ok(())
    }

    pub fn set_reward_multiplier(&mut self, caller: &Address, multiplier: u64) -> Result<(), ConfigError> {
        self.ensure_operator(caller)?;
        check_multiplier("reward_multiplier", multiplier)?;
        self.config.reward_multiplier = multiplier;
        info!(multiplier, "reward multiplier updated");
        Ok(())
    }

    pub fn set_expected_volume_per_epoch(&mut self, caller: &Address, volume: u128) -> Result<(), ConfigError> {
        self.ensure_operator(caller)?;
        check_nonzero_amount("expected_volume_per_epoch", volume)?;
        self.config.expected_volume_per_epoch = volume;
        info!(volume = %volume, "expected volume per epoch updated");
        Ok(())
    }

    /// Set both halves of the penalty split at once; they must sum to 100.
    pub fn set_penalty_split(&mut self, caller: &Address, keep_percent: u8, redirect_percent: u8) -> Result<(), ConfigError> {
        self.ensure_operator(caller)?;
        check_split(keep_percent, redirect_percent)?;
        self.config.penalty_keep_percent = keep_percent;
        self.config.penalty_redirect_percent = redirect_percent;
        info!(keep_percent, redirect_percent, "penalty split updated");
        Ok(())
    }

    pub fn set_incentive_token(&mut self, caller: &Address, token: Address) -> Result<(), ConfigError> {
        self.ensure_operator(caller)?;
        check_address("incentive_token", &token)?;
        self.config.incentive_token = token;
        info!(%token, "incentive token updated");
        Ok(())
    }

    pub fn set_ecosystem_fund(&mut self, caller: &Address, fund: Address) -> Result<(), ConfigError> {
        self.ensure_operator(caller)?;
        check_address("ecosystem_fund", &fund)?;
        self.config.ecosystem_fund = fund;
        info!(%fund, "ecosystem fund updated");
        Ok(())
    }

    /// Zero is accepted and switches rewards off.
    pub fn set_reward_per_epoch(&mut self, caller: &Address, amount: u128) -> Result<(), ConfigError> {
        self.ensure_operator(caller)?;
        self.config.reward_per_epoch = amount;
        info!(amount = %amount, "reward per epoch updated");
        Ok(())
    }

    pub fn set_incentive_token_rate(&mut self, caller: &Address, rate: u128) -> Result<(), ConfigError> {
        self.ensure_operator(caller)?;
        check_nonzero_amount("incentive_token_rate", rate)?;
        self.config.incentive_token_rate = rate;
        info!(rate = %rate, "incentive token rate updated");
        Ok(())
    }
}

fn default_reward_per_epoch() -> u128 {
    DEFAULT_REWARD_PER_EPOCH
}

fn default_target_price() -> u128 {
    DEFAULT_TARGET_PRICE
}

fn default_incentive_token_rate() -> u128 {
    DEFAULT_INCENTIVE_TOKEN_RATE
}

fn default_epoch_duration_secs() -> u64 {
    DEFAULT_EPOCH_DURATION_SECS
}

/// Construction-time parameters for one controller deployment.
///
/// `target_price` seeds both target prices unless a specific override is
/// given. Every other tunable falls back to its default from
/// [`constants`](crate::constants).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeploymentParams {
    pub operator: Address,
    /// The controller's own account on the incentive-token ledger.
    pub controller: Address,
    pub pair: Address,
    pub protocol_token: Address,
    pub ecosystem_fund: Address,
    pub incentive_token: Address,
    #[serde(default = "default_reward_per_epoch", with = "base_units")]
    pub reward_per_epoch: u128,
    #[serde(default = "default_target_price", with = "base_units")]
    pub target_price: u128,
    #[serde(default = "default_incentive_token_rate", with = "base_units")]
    pub incentive_token_rate: u128,
    #[serde(default = "default_epoch_duration_secs")]
    pub epoch_duration_secs: u64,
    /// Start of the first epoch; the clock reading at construction if unset.
    #[serde(default)]
    pub epoch_start_time: Option<u64>,
    #[serde(default, with = "base_units::option")]
    pub penalty_target_price: Option<u128>,
    #[serde(default, with = "base_units::option")]
    pub reward_target_price: Option<u128>,
    #[serde(default)]
    pub penalty_multiplier: Option<u64>,
    #[serde(default)]
    pub reward_multiplier: Option<u64>,
    #[serde(default, with = "base_units::option")]
    pub expected_volume_per_epoch: Option<u128>,
    #[serde(default)]
    pub penalty_keep_percent: Option<u8>,
    #[serde(default)]
    pub penalty_redirect_percent: Option<u8>,    /// Collateral price feed handed to ETH-pair controllers. Carried for the
    /// host; the engines never read it.
    #[serde(default)]
    pub price_feed: Option<Address>,
}

impl DeploymentParams {
    /// Parameters with every optional field at its default.
    pub fn new(
        operator: Address,
        controller: Address,
        pair: Address,
        protocol_token: Address,
        ecosystem_fund: Address,
        incentive_token: Address,
    ) -> Self {
        Self {
            operator,
            controller,
            pair,
            protocol_token,
            ecosystem_fund,
            incentive_token,
            reward_per_epoch: DEFAULT_REWARD_PER_EPOCH,
            target_price: DEFAULT_TARGET_PRICE,
            incentive_token_rate: DEFAULT_INCENTIVE_TOKEN_RATE,
            epoch_duration_secs: DEFAULT_EPOCH_DURATION_SECS,
            epoch_start_time: None,
            penalty_target_price: None,
            reward_target_price: None,
            penalty_multiplier: None,
            reward_multiplier: None,
            expected_volume_per_epoch: None,
            penalty_keep_percent: None,
            penalty_redirect_percent: None,
            price_feed: None,
        }
    }

    /// Load from `path` (format chosen by extension), then apply
    /// `INCENTIVE_*` environment overrides, then validate.
    pub fn load(path: &Path) -> Result<Self, DeploymentError> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    pub fn load_with_env_prefix(path: &Path, prefix: &str) -> Result<Self, DeploymentError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(::config::Environment::with_prefix(prefix))
            .build()?;
        let params: Self = settings.try_deserialize()?;
        params.validate()?;
        info!(path = %path.display(), controller = %params.controller, "deployment loaded");
        Ok(params)
    }

    /// The engine configuration these parameters describe.
    ///
    /// Missing split halves are completed from the given one (`keep = 30`
    /// implies `redirect = 70`).
    pub fn incentive_config(&self) -> IncentiveConfig {
        let (keep, redirect) = match (self.penalty_keep_percent, self.penalty_redirect_percent) {
            (Some(k), Some(r)) => (k, r),
            (Some(k), None) => (k, PERCENT_PRECISION.saturating_sub(k)),
            (None, Some(r)) => (PERCENT_PRECISION.saturating_sub(r), r),
            (None, None) => (DEFAULT_PENALTY_KEEP_PERCENT, DEFAULT_PENALTY_REDIRECT_PERCENT),
        };
        IncentiveConfig {
            penalty_target_price: self.penalty_target_price.unwrap_or(self.target_price),
            reward_target_price: self.reward_target_price.unwrap_or(self.target_price),
            penalty_multiplier: self.penalty_multiplier.unwrap_or(DEFAULT_PENALTY_MULTIPLIER),
            reward_multiplier: self.reward_multiplier.unwrap_or(DEFAULT_REWARD_MULTIPLIER),
            expected_volume_per_epoch: self
                .expected_volume_per_epoch
                .unwrap_or(DEFAULT_EXPECTED_VOLUME_PER_EPOCH),
            penalty_keep_percent: keep,
            penalty_redirect_percent: redirect,
            incentive_token: self.incentive_token,
            ecosystem_fund: self.ecosystem_fund,
            reward_per_epoch: self.reward_per_epoch,
            incentive_token_rate: self.incentive_token_rate,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, address) in [
            ("operator", &self.operator),
            ("controller", &self.controller),
            ("pair", &self.pair),
            ("protocol_token", &self.protocol_token),
        ] {
            check_address(field, address)?;
        }
        if let Some(feed) = &self.price_feed {
            check_address("price_feed", feed)?;
        }
        if self.epoch_duration_secs == 0 {
            return Err(ConfigError::invalid("epoch_duration_secs", "must be nonzero"));
        }
        self.incentive_config().validate()
    }
}
