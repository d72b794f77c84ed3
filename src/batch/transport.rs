// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! The seam between the batcher and the remote ledger

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;

use crate::errors::RpcError;

/// One encoded call sent to the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCall {
    /// Contract receiving the call
    pub target: Address,
    /// Selector followed by ABI-encoded arguments
    pub call_data: Bytes,
}

/// The aggregator's answer for one [`RawCall`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReturn {
    /// `false` if the call reverted
    pub success: bool,
    /// Return data, or revert data when `success` is false
    pub return_data: Bytes,
}

impl RawReturn {
    /// A successful return
    pub fn ok(return_data: impl Into<Bytes>) -> Self {
        Self {
            success: true,
            return_data: return_data.into(),
        }
    }

    /// A reverted call
    pub fn reverted() -> Self {
        Self {
            success: false,
            return_data: Bytes::new(),
        }
    }
}

/// Executes a list of read-only calls in a single round trip
///
/// Implementations must return exactly one [`RawReturn`] per call, in order,
/// and must not fail the round trip because an individual call reverted.
#[async_trait]
pub trait BatchTransport: Send + Sync {
    /// Execute `calls` in one round trip
    async fn aggregate(&self, calls: Vec<RawCall>) -> Result<Vec<RawReturn>, RpcError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
