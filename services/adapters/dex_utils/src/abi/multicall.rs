//! Multicall3 `aggregate3` codec
//!
//! Batches view calls into a single `eth_call` so that every read in a batch
//! observes the same block.

use super::events::DecodingError;
use super::param;
use ethabi::{Function, ParamType, StateMutability, Token};
use web3::types::H160;

/// Multicall3 is deployed at the same address on every supported chain
pub const MULTICALL3_ADDRESS: &str = "0xcA11bde05977b3631167028862bE2a173976CA11";

/// One call inside an `aggregate3` batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticallCall {
    pub target: H160,
    /// When false, a revert in this call reverts the whole batch
    pub allow_failure: bool,
    pub call_data: Vec<u8>,
}

impl MulticallCall {
    pub fn strict(target: H160, call_data: Vec<u8>) -> Self {
        Self {
            target,
            allow_failure: false,
            call_data,
        }
    }

    pub fn optional(target: H160, call_data: Vec<u8>) -> Self {
        Self {
            target,
            allow_failure: true,
            call_data,
        }
    }
}

/// Per-call outcome of an `aggregate3` batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticallResult {
    pub success: bool,
    pub return_data: Vec<u8>,
}

fn call3_kind() -> ParamType {
    ParamType::Tuple(vec![ParamType::Address, ParamType::Bool, ParamType::Bytes])
}

fn result_kind() -> ParamType {
    ParamType::Tuple(vec![ParamType::Bool, ParamType::Bytes])
}

/// function aggregate3((address target, bool allowFailure, bytes callData)[] calls)
///     payable returns ((bool success, bytes returnData)[] returnData)
#[allow(deprecated)]
pub fn aggregate3_function() -> Function {
    Function {
        name: "aggregate3".to_string(),
        inputs: vec![param("calls", ParamType::Array(Box::new(call3_kind())))],
        outputs: vec![param("returnData", ParamType::Array(Box::new(result_kind())))],
        constant: None,
        state_mutability: StateMutability::Payable,
    }
}

/// Call data for an `aggregate3` batch
pub fn encode_aggregate3(calls: &[MulticallCall]) -> Result<Vec<u8>, DecodingError> {
    let tokens = calls
        .iter()
        .map(|c| {
            Token::Tuple(vec![
                Token::Address(c.target),
                Token::Bool(c.allow_failure),
                Token::Bytes(c.call_data.clone()),
            ])
        })
        .collect();

    aggregate3_function()
        .encode_input(&[Token::Array(tokens)])
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))
}

/// Decode the result array of an `aggregate3` batch
pub fn decode_aggregate3(data: &[u8]) -> Result<Vec<MulticallResult>, DecodingError> {
    let decoded = aggregate3_function()
        .decode_output(data)
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))?;

    let results = decoded
        .into_iter()
        .next()
        .and_then(|t| t.into_array())
        .ok_or_else(|| DecodingError::MissingField("returnData".to_string()))?;

    results
        .into_iter()
        .map(|entry| {
            let mut fields = entry
                .into_tuple()
                .ok_or_else(|| DecodingError::MissingField("result tuple".to_string()))?
                .into_iter();
            let success = fields
                .next()
                .and_then(|t| t.into_bool())
                .ok_or_else(|| DecodingError::MissingField("success".to_string()))?;
            let return_data = fields
                .next()
                .and_then(|t| t.into_bytes())
                .ok_or_else(|| DecodingError::MissingField("returnData".to_string()))?;
            Ok(MulticallResult {
                success,
                return_data,
            })
        })
        .collect()
}
