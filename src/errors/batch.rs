// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for batched ledger reads.

use alloy_primitives::Address;

use super::RpcError;

/// Errors produced by [`CallBatcher`](crate::CallBatcher).
///
/// A batch is all-or-nothing: whichever variant is returned, the caller never
/// receives a partially populated [`BatchOutput`](crate::BatchOutput).
///
/// A revert means the contract refused the call; a decode failure means it
/// answered with data that does not match the declared return type.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// A call signature could not be parsed.
    #[error("Invalid call signature '{signature}': {details}")]
    InvalidSignature {
        /// The signature as written by the caller
        signature: String,
        /// Parser message
        details: String,
    },

    /// A call could not be encoded (argument mismatch, duplicate field, ...).
    #[error("Failed to encode call for '{field}': {details}")]
    Encode {
        /// Output field of the offending descriptor
        field: String,
        /// Details about the failure
        details: String,
    },

    /// One call inside the batch reverted, failing the whole batch.
    #[error("Call for '{field}' on {target} reverted")]
    CallReverted {
        /// Output field of the reverted descriptor
        field: String,
        /// Contract the call was sent to
        target: Address,
    },

    /// Returned data did not match the declared output type.
    #[error("Failed to decode '{field}': {details}")]
    Decode {
        /// Output field being decoded
        field: String,
        /// Details about the failure
        details: String,
    },

    /// A field was requested from a batch output that does not carry it.
    #[error("Batch output has no field '{field}'")]
    MissingField {
        /// The requested field name
        field: String,
    },

    /// The aggregator round trip itself failed.
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
}

impl BatchError {
    /// Create an `InvalidSignature` error.
    pub fn invalid_signature(signature: impl Into<String>, details: impl Into<String>) -> Self {
        BatchError::InvalidSignature {
            signature: signature.into(),
            details: details.into(),
        }
    }

    /// Create an `Encode` error.
    pub fn encode(field: impl Into<String>, details: impl Into<String>) -> Self {
        BatchError::Encode {
            field: field.into(),
            details: details.into(),
        }
    }

    /// Create a `Decode` error.
    pub fn decode(field: impl Into<String>, details: impl Into<String>) -> Self {
        BatchError::Decode {
            field: field.into(),
            details: details.into(),
        }
    }

    /// Whether the failure happened on the remote side (network or revert).
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, BatchError::Rpc(_) | BatchError::CallReverted { .. })
    }

    /// Whether the failure is a type mismatch in returned data.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            BatchError::Decode { .. } | BatchError::MissingField { .. }
        )
    }
}
