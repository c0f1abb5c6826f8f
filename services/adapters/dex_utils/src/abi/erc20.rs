//! ERC-20 view functions used to derive pool reserves

use super::events::DecodingError;
use super::param;
use ethabi::{Function, ParamType, StateMutability, Token};
use web3::types::{H160, U256};

/// function balanceOf(address owner) view returns (uint256)
#[allow(deprecated)]
pub fn balance_of_function() -> Function {
    Function {
        name: "balanceOf".to_string(),
        inputs: vec![param("owner", ParamType::Address)],
        outputs: vec![param("", ParamType::Uint(256))],
        constant: None,
        state_mutability: StateMutability::View,
    }
}

/// Call data for `balanceOf(owner)`
pub fn encode_balance_of(owner: H160) -> Result<Vec<u8>, DecodingError> {
    balance_of_function()
        .encode_input(&[Token::Address(owner)])
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))
}

/// Decode a `balanceOf` result as a full-width word
pub fn decode_balance_of(data: &[u8]) -> Result<U256, DecodingError> {
    balance_of_function()
        .decode_output(data)
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))?
        .into_iter()
        .next()
        .and_then(|t| t.into_uint())
        .ok_or_else(|| DecodingError::MissingField("balance".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_of_selector() {
        let data = encode_balance_of(H160::repeat_byte(0x11)).unwrap();
        assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(data.len(), 36);
    }

    #[test]
    fn decode_balance() {
        let data = ethabi::encode(&[Token::Uint(U256::from(123_456u64))]);
        assert_eq!(decode_balance_of(&data).unwrap(), U256::from(123_456u64));
    }
}
