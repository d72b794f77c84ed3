// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration for gaugescan operations
//!
//! A [`GaugescanConfig`] names the protocol contracts the pipeline reads from
//! and controls deadlines, cache validity and the partial-failure policy.
//!
//! # Example: Builder
//!
//! ```rust
//! use alloy_primitives::address;
//! use gaugescan::{GaugescanConfigBuilder, MissingPairPolicy};
//! use std::time::Duration;
//!
//! let config = GaugescanConfigBuilder::new(
//!     address!("0000000000000000000000000000000000000a01"), // voter
//!     address!("0000000000000000000000000000000000000a02"), // reward token
//!     address!("0000000000000000000000000000000000000a03"), // voting escrow
//! )
//! .fetch_timeout(Duration::from_secs(10))
//! .missing_pair_policy(MissingPairPolicy::Abort)
//! .build();
//!
//! assert_eq!(config.fetch_timeout, Duration::from_secs(10));
//! ```
//!
//! # Example: Environment
//!
//! ```rust,ignore
//! use gaugescan::GaugescanConfig;
//!
//! // Reads GAUGESCAN_* variables, loading a .env file if present
//! let config = GaugescanConfig::from_env()?;
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub mod constants;

use constants::{BASE_YIELD_TTL, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_BRIBE_TOKENS, MULTICALL3_ADDRESS};

/// Environment variable holding the voter contract address
pub const ENV_VOTER_ADDRESS: &str = "GAUGESCAN_VOTER_ADDRESS";
/// Environment variable holding the default reward token address
pub const ENV_DEFAULT_TOKEN_ADDRESS: &str = "GAUGESCAN_DEFAULT_TOKEN_ADDRESS";
/// Environment variable holding the voting-escrow contract address
pub const ENV_VE_ADDRESS: &str = "GAUGESCAN_VE_ADDRESS";
/// Optional override of the Multicall3 address
pub const ENV_MULTICALL_ADDRESS: &str = "GAUGESCAN_MULTICALL_ADDRESS";
/// Optional fetch deadline in seconds
pub const ENV_FETCH_TIMEOUT_SECS: &str = "GAUGESCAN_FETCH_TIMEOUT_SECS";
/// Optional missing-pair policy (`degrade` or `abort`)
pub const ENV_MISSING_PAIR_POLICY: &str = "GAUGESCAN_MISSING_PAIR_POLICY";
/// Optional cap on the bribe token list length
pub const ENV_MAX_BRIBE_TOKENS: &str = "GAUGESCAN_MAX_BRIBE_TOKENS";

/// What to do when a gauge's owning pair cannot be resolved
///
/// The pair is needed for internal fees and the voting APR term. Supply,
/// emission and bribe data do not depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPairPolicy {
    /// Persist the gauge without fee and vote terms and flag it as degraded
    #[default]
    Degrade,
    /// Fail the whole fetch with `NotFound`; nothing is persisted
    Abort,
}

impl FromStr for MissingPairPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degrade" => Ok(MissingPairPolicy::Degrade),
            "abort" => Ok(MissingPairPolicy::Abort),
            other => Err(format!("expected 'degrade' or 'abort', got '{other}'")),
        }
    }
}

impl fmt::Display for MissingPairPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingPairPolicy::Degrade => write!(f, "degrade"),
            MissingPairPolicy::Abort => write!(f, "abort"),
        }
    }
}

/// Configuration for gaugescan operations
///
/// Use [`GaugescanConfigBuilder`] for a fluent API to construct instances.
#[derive(Debug, Clone)]
pub struct GaugescanConfig {
    /// Voter contract: bribe addresses, vote weights, minter
    pub voter_address: Address,

    /// Token gauges emit, also the denomination of vote weights
    pub default_token_address: Address,

    /// Voting-escrow contract, source of the locked supply
    pub ve_address: Address,

    /// Multicall3 aggregator
    /// Default: [`MULTICALL3_ADDRESS`]
    pub multicall_address: Address,

    /// Overall deadline for a single gauge fetch
    /// Default: 30 seconds
    pub fetch_timeout: Duration,

    /// Validity window of the base yield
    /// Default: one day
    pub base_yield_ttl: Duration,

    /// Optional expiry for cached gauges
    /// Default: None (gauges live until refreshed)
    pub gauge_ttl: Option<Duration>,

    /// Policy for gauges whose pair cannot be resolved
    /// Default: [`MissingPairPolicy::Degrade`]
    pub missing_pair_policy: MissingPairPolicy,

    /// Longest bribe token list accepted from a bribe contract
    /// Default: [`DEFAULT_MAX_BRIBE_TOKENS`]
    pub max_bribe_tokens: usize,
}

impl GaugescanConfig {
    /// Create a config for the given protocol contracts with default settings
    pub fn new(voter_address: Address, default_token_address: Address, ve_address: Address) -> Self {
        Self {
            voter_address,
            default_token_address,
            ve_address,
            multicall_address: MULTICALL3_ADDRESS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            base_yield_ttl: BASE_YIELD_TTL,
            gauge_ttl: None,
            missing_pair_policy: MissingPairPolicy::default(),
            max_bribe_tokens: DEFAULT_MAX_BRIBE_TOKENS,
        }
    }

    /// Load configuration from `GAUGESCAN_*` environment variables
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// The three contract addresses are required; everything else falls back
    /// to the defaults of [`GaugescanConfig::new`].
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Self::new(
            required_address(ENV_VOTER_ADDRESS)?,
            required_address(ENV_DEFAULT_TOKEN_ADDRESS)?,
            required_address(ENV_VE_ADDRESS)?,
        );

        if let Some(raw) = optional_var(ENV_MULTICALL_ADDRESS) {
            config.multicall_address = raw
                .parse()
                .map_err(|e| ConfigError::invalid(ENV_MULTICALL_ADDRESS, e))?;
        }

        if let Some(raw) = optional_var(ENV_FETCH_TIMEOUT_SECS) {
            let secs: u64 = raw
                .parse()
                .map_err(|e| ConfigError::invalid(ENV_FETCH_TIMEOUT_SECS, e))?;
            config.fetch_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = optional_var(ENV_MISSING_PAIR_POLICY) {
            config.missing_pair_policy = raw
                .parse()
                .map_err(|e| ConfigError::invalid(ENV_MISSING_PAIR_POLICY, e))?;
        }

        if let Some(raw) = optional_var(ENV_MAX_BRIBE_TOKENS) {
            config.max_bribe_tokens = raw
                .parse()
                .map_err(|e| ConfigError::invalid(ENV_MAX_BRIBE_TOKENS, e))?;
        }

        Ok(config)
    }
}

fn optional_var(var: &'static str) -> Option<String> {
    dotenvy::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn required_address(var: &'static str) -> Result<Address, ConfigError> {
    let raw = optional_var(var).ok_or(ConfigError::Missing { var })?;
    raw.trim().parse().map_err(|e| ConfigError::invalid(var, e))
}

/// Builder for [`GaugescanConfig`]
pub struct GaugescanConfigBuilder {
    config: GaugescanConfig,
}

impl GaugescanConfigBuilder {
    /// Create a new builder for the given protocol contracts
    pub fn new(voter_address: Address, default_token_address: Address, ve_address: Address) -> Self {
        Self {
            config: GaugescanConfig::new(voter_address, default_token_address, ve_address),
        }
    }

    /// Override the Multicall3 aggregator address
    pub fn multicall_address(mut self, address: Address) -> Self {
        self.config.multicall_address = address;
        self
    }

    /// Set the overall deadline of a gauge fetch
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    /// Set the validity window of the base yield
    pub fn base_yield_ttl(mut self, ttl: Duration) -> Self {
        self.config.base_yield_ttl = ttl;
        self
    }

    /// Expire cached gauges after `ttl`
    pub fn gauge_ttl(mut self, ttl: Duration) -> Self {
        self.config.gauge_ttl = Some(ttl);
        self
    }

    /// Set the policy for gauges without a resolvable pair
    pub fn missing_pair_policy(mut self, policy: MissingPairPolicy) -> Self {
        self.config.missing_pair_policy = policy;
        self
    }

    /// Cap the number of bribe tokens read per gauge
    pub fn max_bribe_tokens(mut self, max: usize) -> Self {
        self.config.max_bribe_tokens = max;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> GaugescanConfig {
        self.config
    }
}
