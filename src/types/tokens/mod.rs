// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Units of value flowing through a gauge record
//!
//! Raw ledger integers are kept apart from whole-unit amounts and from
//! reference-currency values so a fee can't be added to a vote weight by
//! accident:
//!
//! ```text
//! TokenAmount ──normalize(TokenDecimals)──▶ NormalizedAmount ──× TokenPrice──▶ UsdValue
//! ```

mod amount;
mod decimals;
mod normalized;
mod price;
mod usd;

pub use amount::TokenAmount;
pub use decimals::TokenDecimals;
pub use normalized::NormalizedAmount;
pub use price::TokenPrice;
pub use usd::UsdValue;
