// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for gauge metric computation.

use std::time::Duration;

use super::{BatchError, LookupError, StoreError};

/// Errors returned by [`GaugePipeline`](crate::GaugePipeline).
///
/// Callers of `find`/`fetch` receive either a fully-formed
/// [`Gauge`](crate::Gauge) or one of these; a failed refresh never touches a
/// previously cached entity.
///
/// # Examples
///
/// ```rust,ignore
/// use gaugescan::{GaugeError, GaugePipeline};
///
/// match pipeline.find("0x3b1f...").await {
///     Ok(gauge) => println!("apr: {:.2}%", gauge.apr),
///     Err(GaugeError::NotFound { entity, key }) => eprintln!("no {entity} for {key}"),
///     Err(e) if e.is_remote_failure() => eprintln!("ledger unavailable: {e}"),
///     Err(e) => eprintln!("gauge lookup failed: {e}"),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum GaugeError {
    /// The supplied address is not a valid 20-byte hex address.
    #[error("Invalid address '{input}': {details}")]
    InvalidAddress {
        /// The raw input
        input: String,
        /// Parser message
        details: String,
    },

    /// A dependent entity (token, pair) could not be resolved.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Lookup key, rendered
        key: String,
    },

    /// A batched ledger read failed (network, revert or decode).
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// A dependent lookup failed for reasons other than absence.
    #[error("Lookup error: {0}")]
    Lookup(LookupError),

    /// Ledger data is internally inconsistent (e.g. a zero denominator).
    #[error("Data inconsistency: {details}")]
    DataInconsistency {
        /// What was inconsistent
        details: String,
    },

    /// The entity store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The caller cancelled the fetch.
    #[error("Fetch of {address} cancelled")]
    Cancelled {
        /// Normalized gauge address
        address: String,
    },

    /// The fetch ran past its deadline.
    #[error("Fetch of {address} exceeded deadline of {after:?}")]
    DeadlineExceeded {
        /// Normalized gauge address
        address: String,
        /// Configured deadline
        after: Duration,
    },
}

impl GaugeError {
    /// Create a `DataInconsistency` error.
    pub fn data_inconsistency(details: impl Into<String>) -> Self {
        GaugeError::DataInconsistency {
            details: details.into(),
        }
    }

    /// Whether this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GaugeError::NotFound { .. })
    }

    /// Whether the failure happened on the remote ledger.
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, GaugeError::Batch(e) if e.is_remote_failure())
    }

    /// Whether the failure is a decode mismatch.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, GaugeError::Batch(e) if e.is_decode_failure())
    }
}

impl From<LookupError> for GaugeError {
    fn from(error: LookupError) -> Self {
        match error {
            LookupError::NotFound { entity, key } => GaugeError::NotFound { entity, key },
            other => GaugeError::Lookup(other),
        }
    }
}
