// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! The gauge record and its derived metrics

use std::collections::HashMap;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Entity;
use crate::{NormalizedAmount, TokenDecimals, UsdValue};

/// Derived metrics of one incentive gauge
///
/// Records are produced whole by [`GaugePipeline`](crate::GaugePipeline) and
/// replaced whole on refresh. Records written by older tooling with
/// camelCase field names (`totalSupply`, `bribeAddress`, `feesAddress`)
/// still load.
///
/// # Examples
///
/// ```
/// use alloy_primitives::address;
/// use gaugescan::Gauge;
///
/// let gauge = Gauge::new(address!("00000000000000000000000000000000000000aa"));
/// assert!(!gauge.has_bribes());
/// assert_eq!(gauge.apr, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gauge {
    /// Gauge contract, primary key
    pub address: Address,

    /// Precision of the staked LP shares
    #[serde(default)]
    pub decimals: TokenDecimals,

    /// Staked supply in whole units
    #[serde(alias = "totalSupply", default)]
    pub total_supply: NormalizedAmount,

    /// External bribe contract
    #[serde(alias = "bribeAddress", default)]
    pub bribe_address: Address,

    /// Internal bribe (fee) contract
    #[serde(alias = "feesAddress", default)]
    pub fees_address: Address,

    /// Bribe contract enumerated for rewards; zero when there is none
    #[serde(alias = "wrappedBribeAddress", default)]
    pub wrapped_bribe_address: Address,

    /// Emission of the default reward token per day
    #[serde(default)]
    pub reward: NormalizedAmount,

    /// Accrued bribe and fee amounts per reward token
    #[serde(default)]
    pub rewards: HashMap<Address, NormalizedAmount>,

    /// Value of internal fees
    #[serde(default)]
    pub fees: UsdValue,

    /// Total bribe value: priced bribes plus priced fees
    #[serde(default)]
    pub tbv: UsdValue,

    /// Vote weight in whole default-token units
    #[serde(default)]
    pub votes: NormalizedAmount,

    /// Annual percentage rate
    #[serde(default)]
    pub apr: f64,

    /// Fee and vote terms were skipped because the pair could not be resolved
    #[serde(default)]
    pub degraded: bool,

    /// When the record was computed
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

impl Gauge {
    /// An empty record for `address`
    pub fn new(address: Address) -> Self {
        Self {
            address,
            decimals: TokenDecimals::default(),
            total_supply: NormalizedAmount::ZERO,
            bribe_address: Address::ZERO,
            fees_address: Address::ZERO,
            wrapped_bribe_address: Address::ZERO,
            reward: NormalizedAmount::ZERO,
            rewards: HashMap::new(),
            fees: UsdValue::ZERO,
            tbv: UsdValue::ZERO,
            votes: NormalizedAmount::ZERO,
            apr: 0.0,
            degraded: false,
            fetched_at: Utc::now(),
        }
    }

    /// Whether a wrapped bribe contract is set
    pub fn has_bribes(&self) -> bool {
        !self.wrapped_bribe_address.is_zero()
    }
}

impl Entity for Gauge {
    type Key = Address;
    const KIND: &'static str = "gauge";

    fn key(&self) -> Address {
        self.address
    }
}
