// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Call signatures and descriptors for batched reads
//!
//! A signature is written in compact form, `name(inputs)(outputs)`:
//!
//! ```rust
//! use gaugescan::CallSignature;
//!
//! let sig = CallSignature::parse("rewardRate(address)(uint256)").unwrap();
//! assert_eq!(sig.name(), "rewardRate");
//! assert_eq!(sig.canonical(), "rewardRate(address)");
//! assert_eq!(sig.outputs().len(), 1);
//! ```

use std::fmt;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{keccak256, Address, Bytes};

use crate::errors::BatchError;

/// A parsed read-only function signature with declared return types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignature {
    name: String,
    inputs: Vec<DynSolType>,
    outputs: Vec<DynSolType>,
    selector: [u8; 4],
}

impl CallSignature {
    /// Parse a `name(inputs)(outputs)` signature
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidSignature`] if the name is empty, the
    /// parentheses do not balance, or a type is not a valid Solidity type.
    pub fn parse(signature: &str) -> Result<Self, BatchError> {
        let signature = signature.trim();
        let invalid = |details: &str| BatchError::invalid_signature(signature, details);

        let open = signature
            .find('(')
            .ok_or_else(|| invalid("missing input list"))?;
        let name = signature[..open].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid("function name must be a non-empty identifier"));
        }

        let inputs_end = matching_paren(signature, open).ok_or_else(|| invalid("unbalanced input list"))?;
        let rest = signature[inputs_end + 1..].trim();
        if !rest.starts_with('(') {
            return Err(invalid("missing output list"));
        }
        let outputs_end = matching_paren(rest, 0).ok_or_else(|| invalid("unbalanced output list"))?;
        if outputs_end + 1 != rest.len() {
            return Err(invalid("trailing characters after output list"));
        }

        let inputs = parse_types(signature, &signature[open + 1..inputs_end])?;
        let outputs = parse_types(signature, &rest[1..outputs_end])?;
        if outputs.is_empty() {
            return Err(invalid("a read call must declare at least one output"));
        }

        let mut sig = Self {
            name: name.to_string(),
            inputs,
            outputs,
            selector: [0; 4],
        };
        let hash = keccak256(sig.canonical().as_bytes());
        sig.selector.copy_from_slice(&hash[..4]);
        Ok(sig)
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared input types
    pub fn inputs(&self) -> &[DynSolType] {
        &self.inputs
    }

    /// Declared output types
    pub fn outputs(&self) -> &[DynSolType] {
        &self.outputs
    }

    /// 4-byte function selector
    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    /// Canonical form used for the selector, e.g. `rewards(uint256)`
    pub fn canonical(&self) -> String {
        let inputs: Vec<_> = self.inputs.iter().map(|t| t.sol_type_name()).collect();
        format!("{}({})", self.name, inputs.join(","))
    }

    /// Encode calldata for this function
    ///
    /// `field` only labels errors.
    pub fn encode_call(&self, field: &str, args: &[DynSolValue]) -> Result<Bytes, BatchError> {
        if args.len() != self.inputs.len() {
            return Err(BatchError::encode(
                field,
                format!(
                    "{} expects {} argument(s), got {}",
                    self.canonical(),
                    self.inputs.len(),
                    args.len()
                ),
            ));
        }
        for (index, (ty, value)) in self.inputs.iter().zip(args).enumerate() {
            if !ty.matches(value) {
                return Err(BatchError::encode(
                    field,
                    format!("argument {index} does not match type {}", ty.sol_type_name()),
                ));
            }
        }

        let mut data = self.selector.to_vec();
        data.extend(DynSolValue::Tuple(args.to_vec()).abi_encode_params());
        Ok(data.into())
    }

    /// Encode return data as the contract would
    ///
    /// Used by test ledgers that answer calls from a table.
    pub fn encode_output(&self, values: &[DynSolValue]) -> Bytes {
        DynSolValue::Tuple(values.to_vec()).abi_encode_params().into()
    }

    /// Decode return data into the declared output values
    pub fn decode_output(&self, field: &str, data: &[u8]) -> Result<Vec<DynSolValue>, BatchError> {
        let decoded = DynSolType::Tuple(self.outputs.clone())
            .abi_decode_params(data)
            .map_err(|e| BatchError::decode(field, format!("{}: {e}", self.canonical())))?;

        match decoded {
            DynSolValue::Tuple(values) if values.len() == self.outputs.len() => Ok(values),
            other => Err(BatchError::decode(
                field,
                format!("{}: unexpected shape {other:?}", self.canonical()),
            )),
        }
    }
}

impl fmt::Display for CallSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outputs: Vec<_> = self.outputs.iter().map(|t| t.sol_type_name()).collect();
        write!(f, "{}({})", self.canonical(), outputs.join(","))
    }
}

fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a comma-separated type list as one tuple type.
fn parse_types(signature: &str, list: &str) -> Result<Vec<DynSolType>, BatchError> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }

    let tuple = format!("({list})");
    match DynSolType::parse(&tuple) {
        Ok(DynSolType::Tuple(types)) => Ok(types),
        Ok(other) => Err(BatchError::invalid_signature(
            signature,
            format!("expected a type list, got '{}'", other.sol_type_name()),
        )),
        Err(e) => Err(BatchError::invalid_signature(
            signature,
            format!("bad type list '{list}': {e}"),
        )),
    }
}

/// One read-only call inside a [`CallBatch`](crate::CallBatch)
///
/// The decoded result is stored under `field`. Functions with a single
/// output yield that value directly; multi-output functions yield a tuple.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    pub(crate) target: Address,
    pub(crate) signature: CallSignature,
    pub(crate) args: Vec<DynSolValue>,
    pub(crate) field: String,
}

impl CallDescriptor {
    /// Describe a call to `signature` on `target`, stored under `field`
    pub fn new(
        target: Address,
        signature: &str,
        field: impl Into<String>,
    ) -> Result<Self, BatchError> {
        Ok(Self::from_signature(
            target,
            CallSignature::parse(signature)?,
            field,
        ))
    }

    /// Describe a call with an already parsed signature
    ///
    /// Lets repeated calls to one function share a single parse.
    pub fn from_signature(target: Address, signature: CallSignature, field: impl Into<String>) -> Self {
        Self {
            target,
            signature,
            args: Vec::new(),
            field: field.into(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, value: impl Into<DynSolValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Contract the call is sent to
    pub fn target(&self) -> Address {
        self.target
    }

    /// Output field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Parsed signature
    pub fn signature(&self) -> &CallSignature {
        &self.signature
    }

    pub(crate) fn calldata(&self) -> Result<Bytes, BatchError> {
        self.signature.encode_call(&self.field, &self.args)
    }

    pub(crate) fn decode(&self, data: &[u8]) -> Result<DynSolValue, BatchError> {
        let mut values = self.signature.decode_output(&self.field, data)?;
        if values.len() == 1 {
            Ok(values.remove(0))
        } else {
            Ok(DynSolValue::Tuple(values))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, hex, U256};

    #[test]
    fn test_parse_compact_signature() {
        let sig = CallSignature::parse("rewardRate(address)(uint256)").unwrap();
        assert_eq!(sig.name(), "rewardRate");
        assert_eq!(sig.inputs(), &[DynSolType::Address]);
        assert_eq!(sig.outputs(), &[DynSolType::Uint(256)]);
        assert_eq!(sig.to_string(), "rewardRate(address)(uint256)");
    }

    #[test]
    fn test_selector_matches_known_value() {
        // totalSupply() => 0x18160ddd
        let sig = CallSignature::parse("totalSupply()(uint256)").unwrap();
        assert_eq!(sig.selector(), hex!("18160ddd"));
    }

    #[test]
    fn test_parse_nested_tuple_inputs() {
        let sig = CallSignature::parse("quote((address,uint256),bool)(uint256,address)").unwrap();
        assert_eq!(sig.inputs().len(), 2);
        assert_eq!(sig.outputs().len(), 2);
        assert_eq!(sig.canonical(), "quote((address,uint256),bool)");
        assert_eq!(
            sig.inputs(),
            &[
                DynSolType::Tuple(vec![DynSolType::Address, DynSolType::Uint(256)]),
                DynSolType::Bool,
            ]
        );
        assert_eq!(sig.outputs(), &[DynSolType::Uint(256), DynSolType::Address]);
    }

    #[test]
    fn test_parse_single_tuple_output_keeps_nesting() {
        let sig = CallSignature::parse("slot0()((uint160,int24))").unwrap();
        assert_eq!(
            sig.outputs(),
            &[DynSolType::Tuple(vec![DynSolType::Uint(160), DynSolType::Int(24)])]
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "totalSupply",
            "totalSupply()",
            "(uint256)(uint256)",
            "totalSupply(()(uint256)",
            "totalSupply()(uint257)",
            "totalSupply()(uint256)x",
        ] {
            assert!(
                matches!(CallSignature::parse(bad), Err(BatchError::InvalidSignature { .. })),
                "expected rejection of {bad}"
            );
        }
    }

    #[test]
    fn test_encode_call_checks_arguments() {
        let sig = CallSignature::parse("rewards(uint256)(address)").unwrap();

        let err = sig.encode_call("token_0", &[]).unwrap_err();
        assert!(matches!(err, BatchError::Encode { .. }));

        let err = sig
            .encode_call("token_0", &[DynSolValue::Bool(true)])
            .unwrap_err();
        assert!(matches!(err, BatchError::Encode { .. }));

        let data = sig
            .encode_call("token_0", &[DynSolValue::Uint(U256::from(3), 256)])
            .unwrap();
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[..4], &sig.selector());
        assert_eq!(data[35], 3);
    }

    #[test]
    fn test_decode_output_rejects_short_data() {
        let sig = CallSignature::parse("left(address)(uint256)").unwrap();
        let err = sig.decode_output("left_0", &[0u8; 7]).unwrap_err();
        assert!(matches!(err, BatchError::Decode { .. }));
    }

    #[test]
    fn test_descriptor_decodes_single_output_directly() {
        let target = address!("00000000000000000000000000000000000000aa");
        let descriptor = CallDescriptor::new(target, "minter()(address)", "minter").unwrap();
        let encoded = descriptor
            .signature()
            .encode_output(&[DynSolValue::Address(target)]);

        let value = descriptor.decode(&encoded).unwrap();
        assert_eq!(value.as_address(), Some(target));
    }
}
