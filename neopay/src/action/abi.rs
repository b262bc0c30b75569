//! Runtime ABI encoding for deploy and call actions.
//!
//! The backend supplies contract ABIs as JSON and arguments as JSON values;
//! this module coerces them into Solidity values and produces calldata.

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::json_abi::{JsonAbi, Param};

use crate::error::ValidationError;

/// Parse a JSON ABI value.
pub fn parse_abi(abi: &serde_json::Value) -> Result<JsonAbi, ValidationError> {
    serde_json::from_value(abi.clone()).map_err(|e| ValidationError::Abi(e.to_string()))
}

/// Decode hex bytecode, with or without the 0x prefix.
pub fn decode_bytecode(bytecode: &str) -> Result<Vec<u8>, ValidationError> {
    let code = alloy::primitives::hex::decode(bytecode)
        .map_err(|e| ValidationError::Bytecode(e.to_string()))?;
    if code.is_empty() {
        return Err(ValidationError::Bytecode("empty bytecode".into()));
    }
    Ok(code)
}

/// Coerce JSON argument values against ABI parameter declarations.
fn coerce_params(
    inputs: &[Param],
    values: &[serde_json::Value],
) -> Result<Vec<DynSolValue>, ValidationError> {
    if inputs.len() != values.len() {
        return Err(ValidationError::Param(format!(
            "expected {} argument(s), got {}",
            inputs.len(),
            values.len()
        )));
    }

    inputs
        .iter()
        .zip(values)
        .map(|(param, value)| {
            let ty: DynSolType = param
                .ty
                .parse()
                .map_err(|e| ValidationError::Abi(format!("bad type '{}': {e}", param.ty)))?;
            let literal = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            ty.coerce_str(&literal).map_err(|e| {
                ValidationError::Param(format!(
                    "cannot coerce {literal} into {}: {e}",
                    param.ty
                ))
            })
        })
        .collect()
}

/// ABI-encode constructor arguments for appending to creation bytecode.
///
/// An ABI without a constructor accepts no arguments.
pub fn encode_constructor_args(
    abi: &JsonAbi,
    args: &[serde_json::Value],
) -> Result<Vec<u8>, ValidationError> {
    match &abi.constructor {
        Some(constructor) => {
            let values = coerce_params(&constructor.inputs, args)?;
            Ok(DynSolValue::Tuple(values).abi_encode_params())
        }
        None if args.is_empty() => Ok(Vec::new()),
        None => Err(ValidationError::Param(
            "constructor arguments given but ABI has no constructor".into(),
        )),
    }
}

/// Build calldata (selector + encoded arguments) for a named method.
pub fn encode_call(
    abi: &JsonAbi,
    method: &str,
    params: &[serde_json::Value],
) -> Result<Vec<u8>, ValidationError> {
    let function = abi
        .functions
        .get(method)
        .and_then(|overloads| overloads.first())
        .ok_or_else(|| ValidationError::Abi(format!("method '{method}' not found in ABI")))?;

    let values = coerce_params(&function.inputs, params)?;
    let mut calldata = function.selector().to_vec();
    calldata.extend(DynSolValue::Tuple(values).abi_encode_params());
    Ok(calldata)
}
