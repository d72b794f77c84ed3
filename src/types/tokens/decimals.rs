// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Decimal precision of a token

use serde::{Deserialize, Serialize};

/// Number of decimal places in a token's raw integer amounts
///
/// Gauge LP shares use 18; reward tokens declare their own (6 for USDC-like
/// stablecoins).
///
/// ```
/// use gaugescan::TokenDecimals;
///
/// assert_eq!(TokenDecimals::default(), TokenDecimals::STANDARD);
/// assert_eq!(TokenDecimals::new(6).scale(), 1e6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenDecimals(u8);

impl TokenDecimals {
    /// 18 places
    pub const STANDARD: Self = Self(18);

    pub const fn new(decimals: u8) -> Self {
        Self(decimals)
    }

    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// A zero precision never comes from a well-formed token record
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `10^decimals`
    pub fn scale(&self) -> f64 {
        10_f64.powi(i32::from(self.0))
    }
}

impl Default for TokenDecimals {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl From<u8> for TokenDecimals {
    fn from(decimals: u8) -> Self {
        Self(decimals)
    }
}

impl std::fmt::Display for TokenDecimals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_per_precision() {
        assert_eq!(TokenDecimals::new(0).scale(), 1.0);
        assert_eq!(TokenDecimals::new(6).scale(), 1e6);
        assert_eq!(TokenDecimals::STANDARD.scale(), 1e18);
    }

    #[test]
    fn test_zero_precision_is_flagged() {
        assert!(TokenDecimals::new(0).is_zero());
        assert!(!TokenDecimals::from(6).is_zero());
    }

    #[test]
    fn test_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&TokenDecimals::new(6)).unwrap(), "6");
        let parsed: TokenDecimals = serde_json::from_str("18").unwrap();
        assert_eq!(parsed, TokenDecimals::STANDARD);
    }
}
