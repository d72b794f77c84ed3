// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Raw integer amounts read from the ledger

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use super::decimals::TokenDecimals;
use super::normalized::NormalizedAmount;

/// An amount in a token's smallest unit
///
/// Supplies, reward rates, bribe balances, fees and vote weights all arrive
/// in this form and are normalized before any arithmetic.
///
/// ```
/// use alloy_primitives::U256;
/// use gaugescan::{TokenAmount, TokenDecimals};
///
/// let fees = TokenAmount::new(U256::from(500_000u64));
/// assert_eq!(fees.normalize(TokenDecimals::new(6)).as_f64(), 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenAmount(U256);

impl TokenAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    pub const fn new(raw: U256) -> Self {
        Self(raw)
    }

    pub const fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Nearest `f64`; precision beyond 53 bits is lost
    pub fn as_f64(&self) -> f64 {
        // Decimal digits always parse, whatever the magnitude
        self.0.to_string().parse().unwrap_or(f64::MAX)
    }

    /// `raw / 10^decimals`
    pub fn normalize(&self, decimals: TokenDecimals) -> NormalizedAmount {
        NormalizedAmount::new(self.as_f64() / decimals.scale())
    }
}

impl From<U256> for TokenAmount {
    fn from(raw: U256) -> Self {
        Self(raw)
    }
}

impl From<u64> for TokenAmount {
    fn from(raw: u64) -> Self {
        Self(U256::from(raw))
    }
}

impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
