// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Span creation helpers for gaugescan operations.
//!
//! Telemetry is kept out of business logic: instead of `#[instrument]`
//! attributes, each instrumented operation has a span helper here and the
//! caller attaches it with [`tracing::Instrument`].
//!
//! Usage pattern:
//! ```rust,ignore
//! pub async fn my_operation(&self, gauge: Address) -> Result<T, GaugeError> {
//!     async move {
//!         // Business logic here
//!     }
//!     .instrument(spans::my_operation(gauge))
//!     .await
//! }
//! ```

use alloy_primitives::Address;
use tracing::{Level, Span};

/// Create span for a full gauge fetch.
///
/// Parent: None (root span for this operation)
/// Children: execute_batch, collect_bribes, collect_fees, update_apr
#[inline]
pub(crate) fn fetch_gauge(gauge: Address, forced: bool) -> Span {
    tracing::span!(
        Level::INFO,
        "gaugescan.fetch_gauge",
        gauge = %gauge,
        forced = forced,
    )
}

/// Create span for one aggregated round trip.
///
/// Parent: whichever pipeline step issued the batch
#[inline]
pub(crate) fn execute_batch(calls: usize, transport: &'static str) -> Span {
    tracing::debug_span!(
        "gaugescan.execute_batch",
        calls = calls,
        transport = transport,
    )
}

/// Create span for bribe enumeration on a wrapped bribe contract.
///
/// Parent: fetch_gauge
/// Children: execute_batch (three, in order)
#[inline]
pub(crate) fn collect_bribes(gauge: Address, bribe: Address) -> Span {
    tracing::debug_span!(
        "gaugescan.collect_bribes",
        gauge = %gauge,
        bribe = %bribe,
        tokens = tracing::field::Empty,
    )
}

/// Create span for internal fee collection.
///
/// Parent: fetch_gauge
#[inline]
pub(crate) fn collect_fees(gauge: Address, pair: Address) -> Span {
    tracing::debug_span!("gaugescan.collect_fees", gauge = %gauge, pair = %pair)
}

/// Create span for the voting APR computation.
///
/// Parent: fetch_gauge
/// Children: rebase_apr (on memo miss)
#[inline]
pub(crate) fn update_apr(gauge: Address, pair: Address) -> Span {
    tracing::debug_span!("gaugescan.update_apr", gauge = %gauge, pair = %pair)
}

/// Create span for the protocol base yield computation.
///
/// Parent: update_apr, or None when called directly
#[inline]
pub(crate) fn rebase_apr(voter: Address) -> Span {
    tracing::span!(Level::INFO, "gaugescan.rebase_apr", voter = %voter)
}

/// Create span for a stampede-safe cache lookup.
#[inline]
pub(crate) fn get_or_fetch(kind: &'static str, key: &str) -> Span {
    tracing::trace_span!("gaugescan.get_or_fetch", kind = kind, key = key)
}
