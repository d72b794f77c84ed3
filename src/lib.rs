// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Chain-backed gauge metrics for AMM incentive contracts.
//!
//! gaugescan reads gauge state from an EVM ledger and turns it into records a
//! frontend can show directly: staked supply, daily emission, bribe and fee
//! rewards, total bribe value and voting APR.
//!
//! The building blocks:
//!
//! - [`CallBatcher`]: many typed contract reads in one Multicall3 round trip
//! - [`EntityCache`]: find-or-fetch repository with per-key stampede protection
//!   over a [`MemoryStore`] or [`DiskStore`]
//! - [`TtlMemoizer`]: time-bounded memoization of protocol-wide values
//! - [`GaugePipeline`]: the ordered fetch chain producing [`Gauge`] records
//!
//! # Example
//!
//! ```rust,ignore
//! use gaugescan::provider::{connect_http, ProviderOptions};
//! use gaugescan::{CallBatcher, GaugePipeline, GaugescanConfig};
//! use std::sync::Arc;
//!
//! let config = GaugescanConfig::from_env()?;
//! let connection = connect_http(ProviderOptions::from_env()?)?;
//! let batcher = CallBatcher::new(connection.multicall(&config));
//!
//! let pipeline = GaugePipeline::new(config, batcher, Arc::new(my_tokens), Arc::new(my_pairs));
//! let gauge = pipeline.find("0x3b1f...").await?;
//! println!("apr {:.2}%, tbv {}", gauge.apr, gauge.tbv);
//! ```

pub mod batch;
pub mod cache;
pub mod clock;
pub mod config;
pub mod entities;
pub mod errors;
pub mod memo;
pub mod pipeline;
pub mod provider;
mod tracing;
pub mod transport;
pub mod types;

pub use batch::{
    BatchOutput, BatchTransport, CallBatch, CallBatcher, CallDescriptor, CallSignature,
    Multicall3Transport, RawCall, RawReturn,
};
pub use cache::{
    CacheStats, DiskStore, Entity, EntityCache, EntityPredicate, EntityStore, MemoryStore,
    StoredEntity,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{GaugescanConfig, GaugescanConfigBuilder, MissingPairPolicy};
pub use entities::{parse_address, Gauge, Pair, PairSource, Token, TokenSource};
pub use errors::{BatchError, ConfigError, GaugeError, LookupError, RpcError, StoreError};
pub use memo::TtlMemoizer;
pub use pipeline::{GaugePipeline, RewardLedger};
pub use types::cache::TimestampMillis;
pub use types::tokens::{NormalizedAmount, TokenAmount, TokenDecimals, TokenPrice, UsdValue};
