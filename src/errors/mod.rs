// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the gaugescan library.
//!
//! Each layer has its own error type, and the outer layers wrap the inner ones
//! through `From` implementations so `?` propagates naturally:
//!
//! - [`RpcError`] - the aggregator round trip itself failed
//! - [`BatchError`] - a batched read failed (wraps [`RpcError`])
//! - [`StoreError`] - an entity store failed
//! - [`ConfigError`] - configuration could not be read from the environment
//! - [`LookupError`] - a token or pair collaborator failed
//! - [`GaugeError`] - gauge metric computation failed (wraps batch, store and lookup errors)
//!
//! # Examples
//!
//! ```rust,ignore
//! use gaugescan::{BatchError, CallBatch, CallDescriptor};
//!
//! match batcher.execute(batch).await {
//!     Ok(output) => println!("supply: {}", output.uint("total_supply")?),
//!     Err(BatchError::CallReverted { field, target }) => {
//!         eprintln!("{field} reverted on {target}");
//!     }
//!     Err(e) if e.is_decode_failure() => eprintln!("unexpected return type: {e}"),
//!     Err(e) => eprintln!("batch failed: {e}"),
//! }
//! ```

mod batch;
mod config;
mod gauge;
mod lookup;
mod rpc;
mod store;

pub use batch::BatchError;
pub use config::ConfigError;
pub use gauge::GaugeError;
pub use lookup::LookupError;
pub use rpc::RpcError;
pub use store::StoreError;
