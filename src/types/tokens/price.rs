// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Token prices in the reference currency

use serde::{Deserialize, Serialize};

use super::normalized::NormalizedAmount;
use super::usd::UsdValue;

/// Reference-currency price of one whole token
///
/// An unknown price is `Option::<TokenPrice>::None`, never zero.
///
/// ```
/// use gaugescan::{NormalizedAmount, TokenPrice, UsdValue};
///
/// let price = TokenPrice::new(2.0);
/// assert_eq!(price.value_of(NormalizedAmount::new(100.0)), UsdValue::new(200.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenPrice(f64);

impl TokenPrice {
    pub const fn new(price: f64) -> Self {
        Self(price)
    }

    pub const fn as_f64(&self) -> f64 {
        self.0
    }

    /// Value of `amount` whole tokens
    pub fn value_of(&self, amount: NormalizedAmount) -> UsdValue {
        UsdValue::new(self.0 * amount.as_f64())
    }
}

impl std::fmt::Display for TokenPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}
