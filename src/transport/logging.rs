// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower layer that traces and counts JSON-RPC round trips.
//!
//! Every request packet reaching the HTTP client is one round trip to the
//! ledger. Batched gauge reads should keep this number small, so the layer
//! exposes a shared [`RoundTripCounter`] next to its tracing output.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::Instant,
};

use alloy_json_rpc::{RequestPacket, ResponsePacket};
use alloy_transport::TransportError;
use tower::Layer;
use tracing::{debug, trace, warn, Instrument};

/// Shared count of request packets sent through a [`LoggingLayer`]
#[derive(Clone, Debug, Default)]
pub struct RoundTripCounter(Arc<AtomicU64>);

impl RoundTripCounter {
    /// Round trips seen so far
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// A Tower layer that wraps each RPC request packet in a span.
///
/// Method names and timings are logged at DEBUG; payloads only at TRACE and
/// only when [`with_payloads`](Self::with_payloads) is set.
///
/// # Example
///
/// ```rust,ignore
/// use gaugescan::transport::LoggingLayer;
/// use alloy_rpc_client::ClientBuilder;
///
/// let layer = LoggingLayer::new();
/// let round_trips = layer.counter();
/// let client = ClientBuilder::default().layer(layer).http(rpc_url);
/// // ... after a gauge fetch
/// println!("{} round trips", round_trips.get());
/// ```
#[derive(Clone, Debug, Default)]
pub struct LoggingLayer {
    log_payloads: bool,
    counter: RoundTripCounter,
}

impl LoggingLayer {
    /// Layer logging method names and timings
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log request and response payloads at TRACE
    pub fn with_payloads(mut self) -> Self {
        self.log_payloads = true;
        self
    }

    /// Counter shared by every service this layer builds
    pub fn counter(&self) -> RoundTripCounter {
        self.counter.clone()
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        LoggingService {
            service,
            log_payloads: self.log_payloads,
            counter: self.counter.clone(),
        }
    }
}

/// Service produced by [`LoggingLayer`]
#[derive(Clone, Debug)]
pub struct LoggingService<S> {
    service: S,
    log_payloads: bool,
    counter: RoundTripCounter,
}

impl<S> tower::Service<RequestPacket> for LoggingService<S>
where
    S: tower::Service<RequestPacket, Response = ResponsePacket, Error = TransportError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: RequestPacket) -> Self::Future {
        let log_payloads = self.log_payloads;
        let mut service = self.service.clone();
        let method = describe(&request);
        let round_trip = self.counter.increment();

        let span = tracing::debug_span!("gaugescan.rpc", method = %method, round_trip);

        Box::pin(
            async move {
                let start = Instant::now();
                if log_payloads {
                    trace!(request = ?request, "RPC request");
                }

                let result = service.call(request).await;
                let elapsed_ms = start.elapsed().as_millis() as u64;

                match &result {
                    Ok(response) if log_payloads => {
                        trace!(response = ?response, elapsed_ms, "RPC response");
                    }
                    Ok(_) => debug!(elapsed_ms, "RPC response"),
                    Err(e) => warn!(error = %e, elapsed_ms, "RPC request failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}

/// Method name of a packet; batches render as `batch(n)`.
fn describe(request: &RequestPacket) -> String {
    match request {
        RequestPacket::Single(req) => req.method().to_string(),
        RequestPacket::Batch(reqs) if reqs.len() == 1 => reqs[0].method().to_string(),
        RequestPacket::Batch(reqs) => format!("batch({})", reqs.len()),
    }
}
