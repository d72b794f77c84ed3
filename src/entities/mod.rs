// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Entity records managed by [`EntityCache`](crate::EntityCache)
//!
//! - [`Gauge`]: computed by the pipeline
//! - [`Token`], [`Pair`]: owned by upstream collaborators, read through
//!   [`TokenSource`] and [`PairSource`]

use alloy_primitives::Address;

use crate::errors::GaugeError;

mod gauge;
mod pair;
mod token;

pub use gauge::Gauge;
pub use pair::{Pair, PairSource};
pub use token::{Token, TokenSource};

/// Parse a user-supplied address into its normalized key
///
/// Hex case is ignored, so checksummed and lowercase spellings produce the
/// same key.
///
/// # Examples
///
/// ```
/// use gaugescan::parse_address;
///
/// let upper = parse_address("0x00000000000000000000000000000000000000AA").unwrap();
/// let lower = parse_address(" 0x00000000000000000000000000000000000000aa ").unwrap();
/// assert_eq!(upper, lower);
/// assert!(parse_address("0xGAUGE").is_err());
/// ```
pub fn parse_address(input: &str) -> Result<Address, GaugeError> {
    let trimmed = input.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    hex.to_ascii_lowercase()
        .parse::<Address>()
        .map_err(|e| GaugeError::InvalidAddress {
            input: input.to_string(),
            details: e.to_string(),
        })
}
