// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower middleware for the RPC client behind [`Multicall3Transport`](crate::Multicall3Transport).
//!
//! ```rust,ignore
//! use gaugescan::transport::LoggingLayer;
//! use alloy_rpc_client::ClientBuilder;
//! use alloy_provider::ProviderBuilder;
//!
//! let client = ClientBuilder::default()
//!     .layer(LoggingLayer::new())
//!     .http(rpc_url);
//!
//! let provider = ProviderBuilder::new().connect_client(client);
//! ```

mod logging;

pub use logging::{LoggingLayer, LoggingService, RoundTripCounter};
