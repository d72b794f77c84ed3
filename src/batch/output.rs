// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Decoded results of a batch, keyed by output field

use std::collections::HashMap;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};

use crate::errors::BatchError;
use crate::TokenAmount;

/// Named results of one executed [`CallBatch`](crate::CallBatch)
///
/// Typed getters fail with [`BatchError::MissingField`] for unknown fields
/// and [`BatchError::Decode`] when the value has a different type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutput {
    values: HashMap<String, DynSolValue>,
}

impl BatchOutput {
    pub(crate) fn insert(&mut self, field: String, value: DynSolValue) {
        self.values.insert(field, value);
    }

    /// Raw decoded value of `field`
    pub fn get(&self, field: &str) -> Result<&DynSolValue, BatchError> {
        self.values.get(field).ok_or_else(|| BatchError::MissingField {
            field: field.to_string(),
        })
    }

    /// `field` as an unsigned integer
    pub fn uint(&self, field: &str) -> Result<U256, BatchError> {
        match self.get(field)? {
            DynSolValue::Uint(value, _) => Ok(*value),
            other => Err(type_mismatch(field, "uint", other)),
        }
    }

    /// `field` as a raw token amount
    pub fn amount(&self, field: &str) -> Result<TokenAmount, BatchError> {
        self.uint(field).map(TokenAmount::new)
    }

    /// `field` as an address
    pub fn address(&self, field: &str) -> Result<Address, BatchError> {
        match self.get(field)? {
            DynSolValue::Address(value) => Ok(*value),
            other => Err(type_mismatch(field, "address", other)),
        }
    }

    /// `field` as a `u64`, failing if the value does not fit
    pub fn u64(&self, field: &str) -> Result<u64, BatchError> {
        let value = self.uint(field)?;
        u64::try_from(value)
            .map_err(|_| BatchError::decode(field, format!("{value} does not fit in u64")))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the output carries no fields
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn type_mismatch(field: &str, expected: &str, found: &DynSolValue) -> BatchError {
    let found = found
        .as_type()
        .map(|t| t.sol_type_name().into_owned())
        .unwrap_or_else(|| "unknown".to_string());
    BatchError::decode(field, format!("expected {expected}, found {found}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn output() -> BatchOutput {
        let mut output = BatchOutput::default();
        output.insert("supply".into(), DynSolValue::Uint(U256::from(42u64), 256));
        output.insert(
            "bribe".into(),
            DynSolValue::Address(address!("00000000000000000000000000000000000000bb")),
        );
        output
    }

    #[test]
    fn test_typed_getters() {
        let output = output();
        assert_eq!(output.uint("supply").unwrap(), U256::from(42u64));
        assert_eq!(output.u64("supply").unwrap(), 42);
        assert_eq!(output.amount("supply").unwrap(), TokenAmount::from(42u64));
        assert_eq!(
            output.address("bribe").unwrap(),
            address!("00000000000000000000000000000000000000bb")
        );
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn test_missing_field() {
        let err = output().uint("votes").unwrap_err();
        assert!(matches!(err, BatchError::MissingField { field } if field == "votes"));
    }

    #[test]
    fn test_type_mismatch_is_decode_failure() {
        let err = output().address("supply").unwrap_err();
        assert!(err.is_decode_failure());
        assert!(matches!(err, BatchError::Decode { .. }));
    }

    #[test]
    fn test_u64_overflow() {
        let mut output = BatchOutput::default();
        output.insert("big".into(), DynSolValue::Uint(U256::MAX, 256));
        assert!(matches!(output.u64("big"), Err(BatchError::Decode { .. })));
    }
}
