// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for configuration loading.

/// Errors raised while reading [`GaugescanConfig`](crate::GaugescanConfig)
/// from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("Missing environment variable {var}")]
    Missing {
        /// Variable name
        var: &'static str,
    },

    /// A variable is set but its value cannot be parsed.
    #[error("Invalid value for {var}: {details}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// Parser message
        details: String,
    },
}

impl ConfigError {
    /// Create an `Invalid` error.
    pub fn invalid(var: &'static str, details: impl ToString) -> Self {
        ConfigError::Invalid {
            var,
            details: details.to_string(),
        }
    }
}
