// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for type safety across gaugescan.
//!
//! This module provides newtype wrappers for domain concepts:
//! - Token amounts, decimals, prices and reference-currency values
//! - Cache metadata (timestamps)

pub mod cache;
pub mod tokens;

// Note: Public types are re-exported from lib.rs, not here
