// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Reward tokens and their upstream source

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::Entity;
use crate::errors::LookupError;
use crate::{NormalizedAmount, TokenAmount, TokenDecimals, TokenPrice, UsdValue};

/// An ERC-20 token as seen by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Token contract
    pub address: Address,
    /// Decimal places of raw amounts
    pub decimals: TokenDecimals,
    /// Price in the reference currency; `None` when unknown
    #[serde(default)]
    pub price: Option<TokenPrice>,
}

impl Token {
    /// Create a token record
    pub fn new(address: Address, decimals: impl Into<TokenDecimals>, price: Option<TokenPrice>) -> Self {
        Self {
            address,
            decimals: decimals.into(),
            price,
        }
    }

    /// Convert a raw on-chain amount into whole units
    pub fn normalize(&self, raw: TokenAmount) -> NormalizedAmount {
        raw.normalize(self.decimals)
    }

    /// Value of `amount`, or `None` if the token is unpriced
    pub fn value_of(&self, amount: NormalizedAmount) -> Option<UsdValue> {
        self.price.map(|price| price.value_of(amount))
    }
}

impl Entity for Token {
    type Key = Address;
    const KIND: &'static str = "token";

    fn key(&self) -> Address {
        self.address
    }
}

/// Upstream lookup of token metadata and prices
///
/// Implementations return [`LookupError::NotFound`] only when the token
/// cannot be resolved at all; a token without a price is returned with
/// `price: None`.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Resolve `address`
    async fn fetch_token(&self, address: Address) -> Result<Token, LookupError>;
}
