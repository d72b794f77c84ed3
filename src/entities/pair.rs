// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Liquidity pairs and their upstream source

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::Entity;
use crate::errors::LookupError;

/// An AMM pair, linked to its gauge by address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    /// Pair contract, also the vote target on the voter
    pub address: Address,
    /// Token credited with `fees0`
    pub token0_address: Address,
    /// Token credited with `fees1`
    pub token1_address: Address,
    /// Gauge staking this pair's LP shares
    pub gauge_address: Address,
}

impl Entity for Pair {
    type Key = Address;
    const KIND: &'static str = "pair";

    fn key(&self) -> Address {
        self.address
    }
}

/// Upstream lookup of the pair owning a gauge
#[async_trait]
pub trait PairSource: Send + Sync {
    /// Pair whose `gauge_address` is `gauge`
    ///
    /// Returns [`LookupError::NotFound`] if no pair stakes into `gauge`.
    async fn pair_for_gauge(&self, gauge: Address) -> Result<Pair, LookupError>;
}
