// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Batched read aggregation
//!
//! A [`CallBatch`] collects independent read-only calls; [`CallBatcher`]
//! sends them through a [`BatchTransport`] in one round trip and returns a
//! [`BatchOutput`] keyed by field name.
//!
//! A batch is all-or-nothing. If any call reverts the whole batch fails with
//! [`BatchError::CallReverted`], and data that does not match a declared
//! return type fails with [`BatchError::Decode`].
//!
//! # Examples
//!
//! ```rust,ignore
//! use alloy_dyn_abi::DynSolValue;
//! use gaugescan::{CallBatch, CallBatcher, CallDescriptor};
//!
//! let mut batch = CallBatch::new();
//! batch.push(CallDescriptor::new(gauge, "totalSupply()(uint256)", "total_supply")?)?;
//! batch.push(
//!     CallDescriptor::new(gauge, "rewardRate(address)(uint256)", "reward_rate")?
//!         .arg(DynSolValue::Address(reward_token)),
//! )?;
//!
//! let output = batcher.execute(batch).await?;
//! let supply = output.uint("total_supply")?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use alloy_dyn_abi::DynSolValue;
use tracing::{debug, trace, warn, Instrument};

use crate::errors::BatchError;
use crate::tracing::spans;

mod descriptor;
mod multicall;
mod output;
mod transport;

pub use descriptor::{CallDescriptor, CallSignature};
pub use multicall::Multicall3Transport;
pub use output::BatchOutput;
pub use transport::{BatchTransport, RawCall, RawReturn};

/// An ordered set of calls with unique output fields
#[derive(Debug, Clone, Default)]
pub struct CallBatch {
    calls: Vec<CallDescriptor>,
    fields: HashSet<String>,
}

impl CallBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a call
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Encode`] if another call already uses the same
    /// output field.
    pub fn push(&mut self, call: CallDescriptor) -> Result<(), BatchError> {
        if !self.fields.insert(call.field.clone()) {
            return Err(BatchError::encode(
                call.field,
                "duplicate output field in batch",
            ));
        }
        self.calls.push(call);
        Ok(())
    }

    /// Builder-style [`push`](Self::push)
    pub fn with(mut self, call: CallDescriptor) -> Result<Self, BatchError> {
        self.push(call)?;
        Ok(self)
    }

    /// Number of calls
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether the batch holds no calls
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Executes [`CallBatch`]es through a shared transport
#[derive(Clone)]
pub struct CallBatcher {
    transport: Arc<dyn BatchTransport>,
}

impl CallBatcher {
    /// Create a batcher over `transport`
    pub fn new(transport: impl BatchTransport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Create a batcher over an already shared transport
    pub fn from_shared(transport: Arc<dyn BatchTransport>) -> Self {
        Self { transport }
    }

    /// Execute all calls of `batch` in one round trip
    ///
    /// An empty batch returns an empty output without touching the transport.
    pub async fn execute(&self, batch: CallBatch) -> Result<BatchOutput, BatchError> {
        if batch.is_empty() {
            return Ok(BatchOutput::default());
        }

        let span = spans::execute_batch(batch.len(), self.transport.name());
        self.execute_inner(batch).instrument(span).await
    }

    async fn execute_inner(&self, batch: CallBatch) -> Result<BatchOutput, BatchError> {
        let raw_calls = batch
            .calls
            .iter()
            .map(|call| {
                Ok(RawCall {
                    target: call.target,
                    call_data: call.calldata()?,
                })
            })
            .collect::<Result<Vec<_>, BatchError>>()?;

        trace!(calls = raw_calls.len(), "Sending batch");
        let returns = self.transport.aggregate(raw_calls).await?;

        if returns.len() != batch.calls.len() {
            return Err(BatchError::decode(
                "<batch>",
                format!(
                    "aggregator returned {} results for {} calls",
                    returns.len(),
                    batch.calls.len()
                ),
            ));
        }

        // Reverts take precedence over decode errors anywhere in the batch
        if let Some((call, _)) = batch
            .calls
            .iter()
            .zip(&returns)
            .find(|(_, ret)| !ret.success)
        {
            warn!(field = %call.field, target = %call.target, "Call reverted, failing batch");
            return Err(BatchError::CallReverted {
                field: call.field.clone(),
                target: call.target,
            });
        }

        let mut output = BatchOutput::default();
        for (call, ret) in batch.calls.into_iter().zip(returns) {
            let value = call.decode(&ret.return_data)?;
            output.insert(call.field, value);
        }

        debug!(fields = output.len(), "Batch decoded");
        Ok(output)
    }

    /// Execute a single call and return its decoded value
    pub async fn call(&self, call: CallDescriptor) -> Result<DynSolValue, BatchError> {
        let field = call.field.clone();
        let output = self.execute(CallBatch::new().with(call)?).await?;
        output.get(&field).cloned()
    }

    /// Name of the underlying transport
    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }
}
