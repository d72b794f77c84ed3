// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Shared RPC error types for ledger provider operations.
//!
//! These cover failures of the transport itself (the aggregator round trip),
//! as opposed to reverts of individual calls inside a batch.

use std::time::Duration;

/// Errors that can occur while talking to the remote ledger.
///
/// # Examples
///
/// ```rust
/// use gaugescan::RpcError;
/// use std::time::Duration;
///
/// let error = RpcError::Timeout {
///     operation: "aggregate3 (4 calls)".to_string(),
///     after: Duration::from_secs(30),
/// };
/// assert!(error.to_string().contains("aggregate3"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The RPC endpoint URL could not be parsed.
    #[error("Invalid provider URL: {0}")]
    ProviderUrlInvalid(String),

    /// Failed to connect to the ledger or execute an RPC call.
    ///
    /// Network errors, provider downtime and JSON-RPC level errors all land
    /// here.
    #[error("Chain connection failed during {operation}")]
    ChainConnectionFailed {
        /// What was being sent
        operation: String,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The aggregator did not answer in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Description of the operation that timed out
        operation: String,
        /// How long we waited
        after: Duration,
    },

    /// The aggregator answered with data we could not interpret at all.
    #[error("Malformed aggregator response during {operation}: {details}")]
    MalformedResponse {
        /// Description of the operation
        operation: String,
        /// What was wrong with the response
        details: String,
    },
}

impl RpcError {
    /// Wrap a transport error raised during `operation`.
    pub fn chain_connection_failed(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RpcError::ChainConnectionFailed {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Helper to create a `MalformedResponse` error.
    pub fn malformed_response(operation: impl Into<String>, details: impl Into<String>) -> Self {
        RpcError::MalformedResponse {
            operation: operation.into(),
            details: details.into(),
        }
    }
}
