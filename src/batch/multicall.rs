// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Multicall3 `aggregate3` transport over an alloy provider

use std::marker::PhantomData;
use std::time::Duration;

use alloy_network::{Network, TransactionBuilder};
use alloy_primitives::Address;
use alloy_provider::Provider;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::transport::{BatchTransport, RawCall, RawReturn};
use crate::config::constants::MULTICALL3_ADDRESS;
use crate::errors::RpcError;

sol! {
    /// Subset of the Multicall3 interface used for batched reads
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Call3Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Call3Result[] memory returnData);
    }
}

/// [`BatchTransport`] issuing one `eth_call` to Multicall3 per batch
///
/// Every call is sent with `allowFailure = true` so a revert comes back as
/// an unsuccessful entry; the batcher decides what a revert means.
///
/// # Examples
///
/// ```rust,ignore
/// use gaugescan::{CallBatcher, Multicall3Transport};
/// use gaugescan::provider::{connect_http, ProviderOptions};
///
/// let provider = connect_http(ProviderOptions::new("https://rpc.example"))?;
/// let batcher = CallBatcher::new(Multicall3Transport::new(provider));
/// ```
pub struct Multicall3Transport<P, N> {
    provider: P,
    address: Address,
    timeout: Option<Duration>,
    _network: PhantomData<fn() -> N>,
}

impl<P, N> Multicall3Transport<P, N>
where
    P: Provider<N>,
    N: Network,
{
    /// Use the canonical Multicall3 deployment
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            address: MULTICALL3_ADDRESS,
            timeout: None,
            _network: PhantomData,
        }
    }

    /// Use a Multicall3 deployment at a non-standard address
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Fail a round trip that takes longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl<P, N> BatchTransport for Multicall3Transport<P, N>
where
    P: Provider<N> + Send + Sync,
    N: Network,
{
    async fn aggregate(&self, calls: Vec<RawCall>) -> Result<Vec<RawReturn>, RpcError> {
        let operation = format!("aggregate3 ({} calls)", calls.len());
        let expected = calls.len();

        let input = IMulticall3::aggregate3Call {
            calls: calls
                .into_iter()
                .map(|call| IMulticall3::Call3 {
                    target: call.target,
                    allowFailure: true,
                    callData: call.call_data,
                })
                .collect(),
        }
        .abi_encode();

        let tx = N::TransactionRequest::default()
            .with_to(self.address)
            .with_input(input);

        let call = self.provider.call(tx);
        let raw = match self.timeout {
            Some(after) => tokio::time::timeout(after, call)
                .await
                .map_err(|_| RpcError::Timeout {
                    operation: operation.clone(),
                    after,
                })?,
            None => call.await,
        }
        .map_err(|e| {
            warn!(error = %e, "{operation} failed");
            RpcError::chain_connection_failed(operation.clone(), e)
        })?;

        let results = IMulticall3::aggregate3Call::abi_decode_returns(&raw)
            .map_err(|e| RpcError::malformed_response(operation.clone(), e.to_string()))?;

        if results.len() != expected {
            return Err(RpcError::malformed_response(
                operation,
                format!("expected {expected} results, got {}", results.len()),
            ));
        }

        debug!(calls = expected, "{operation} completed");

        Ok(results
            .into_iter()
            .map(|r| RawReturn {
                success: r.success,
                return_data: r.returnData,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "multicall3"
    }
}
