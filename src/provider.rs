// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP provider construction for the Multicall3 transport
//!
//! The pipeline only issues `eth_call`s, so a bare [`RootProvider`] without
//! fillers is all it needs. [`AnyNetwork`] keeps the crate usable on any EVM
//! chain the voter contract is deployed to.
//!
//! ```rust,ignore
//! use gaugescan::provider::{connect_http, ProviderOptions};
//! use gaugescan::{CallBatcher, GaugescanConfig};
//!
//! let config = GaugescanConfig::from_env()?;
//! let connection = connect_http(ProviderOptions::from_env()?)?;
//! let batcher = CallBatcher::new(connection.multicall(&config));
//! // ...
//! tracing::info!(round_trips = connection.round_trips.get(), "done");
//! ```

use alloy_network::AnyNetwork;
use alloy_provider::{ProviderBuilder, RootProvider};
use alloy_rpc_client::ClientBuilder;

use crate::batch::Multicall3Transport;
use crate::config::GaugescanConfig;
use crate::errors::{ConfigError, RpcError};
use crate::transport::{LoggingLayer, RoundTripCounter};

/// Environment variable holding the RPC endpoint
pub const ENV_RPC_URL: &str = "GAUGESCAN_RPC_URL";

/// Provider used by [`connect_http`]
pub type GaugeProvider = RootProvider<AnyNetwork>;

/// Options for [`connect_http`]
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    /// RPC endpoint URL
    pub url: String,
    /// Log request and response payloads at TRACE
    pub log_payloads: bool,
}

impl ProviderOptions {
    /// Options for `url` with payload logging off
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            log_payloads: false,
        }
    }

    /// Read the endpoint from `GAUGESCAN_RPC_URL`, loading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let url = dotenvy::var(ENV_RPC_URL).map_err(|_| ConfigError::Missing { var: ENV_RPC_URL })?;
        Ok(Self::new(url))
    }

    /// Also log payloads
    #[must_use]
    pub fn with_payloads(mut self) -> Self {
        self.log_payloads = true;
        self
    }
}

/// A connected provider and its round-trip counter
#[derive(Clone)]
pub struct HttpConnection {
    /// The provider
    pub provider: GaugeProvider,
    /// Request packets sent through `provider`
    pub round_trips: RoundTripCounter,
}

impl HttpConnection {
    /// Multicall3 transport over this provider, addressed and timed per `config`
    pub fn multicall(&self, config: &GaugescanConfig) -> Multicall3Transport<GaugeProvider, AnyNetwork> {
        Multicall3Transport::new(self.provider.clone())
            .with_address(config.multicall_address)
            .with_timeout(config.fetch_timeout)
    }
}

/// Connect to an HTTP endpoint with the logging layer installed
///
/// # Errors
///
/// [`RpcError::ProviderUrlInvalid`] if the URL does not parse.
pub fn connect_http(options: ProviderOptions) -> Result<HttpConnection, RpcError> {
    let url: url::Url = options
        .url
        .parse()
        .map_err(|e| RpcError::ProviderUrlInvalid(format!("{}: {e}", options.url)))?;

    let layer = if options.log_payloads {
        LoggingLayer::new().with_payloads()
    } else {
        LoggingLayer::new()
    };
    let round_trips = layer.counter();

    let client = ClientBuilder::default().layer(layer).http(url);
    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .network::<AnyNetwork>()
        .connect_client(client);

    Ok(HttpConnection {
        provider,
        round_trips,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_url() {
        let result = connect_http(ProviderOptions::new("not a url"));
        assert!(matches!(result, Err(RpcError::ProviderUrlInvalid(_))));
    }

    #[tokio::test]
    async fn test_connect_http_starts_with_zero_round_trips() {
        let connection = connect_http(ProviderOptions::new("http://localhost:8545")).unwrap();
        assert_eq!(connection.round_trips.get(), 0);
    }
}
