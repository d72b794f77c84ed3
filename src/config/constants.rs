// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Well-known addresses and protocol constants
//!
//! Centralizes the magic numbers used by the gauge pipeline so the metric
//! formulas read in terms of names.

use std::time::Duration;

use alloy_primitives::{address, Address};

use crate::TokenDecimals;

/// Seconds in a day; reward rates are per-second and reported per-day.
pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Voting periods per year; bribes are weekly, so APR compounds over 52 epochs.
pub const WEEKS_PER_YEAR: f64 = 52.0;

/// Precision of gauge LP shares.
pub const DEFAULT_DECIMALS: TokenDecimals = TokenDecimals::STANDARD;

/// Validity window of the protocol-wide base yield.
pub const BASE_YIELD_TTL: Duration = Duration::from_secs(SECONDS_PER_DAY);

/// Default deadline for a full gauge fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upper bound on the bribe token list of a single gauge.
pub const DEFAULT_MAX_BRIBE_TOKENS: usize = 64;

/// Multicall3, deployed at the same address on every major EVM chain.
///
/// Contract: 0xcA11bde05977b3631167028862bE2a173976CA11
pub const MULTICALL3_ADDRESS: Address = address!("ca11bde05977b3631167028862be2a173976ca11");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_per_day() {
        assert_eq!(SECONDS_PER_DAY, 86_400);
        assert_eq!(BASE_YIELD_TTL, Duration::from_secs(86_400));
    }

    #[test]
    fn test_multicall3_address() {
        assert_eq!(
            format!("{MULTICALL3_ADDRESS:#x}"),
            "0xca11bde05977b3631167028862be2a173976ca11"
        );
    }
}
