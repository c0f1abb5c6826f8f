//! Uniswap V3 and compatible protocol ABIs
//!
//! Canonical event definitions for the liquidity events the tick tracker
//! replays, plus the pool view functions it reads through Multicall3.
//! Return decoders only read the leading words they need so that forks with
//! extra trailing fields (Pancake V3 `slot0`, Algebra-style `ticks`) decode too.

use super::conversions::{safe_u256_to_u128, tick_to_u256, u256_to_i128, u256_to_tick};
use super::events::DecodingError;
use super::param;
use ethabi::{Event, EventParam, Function, ParamType, StateMutability, Token};
use web3::types::U256;

const WORD: usize = 32;

/// Uniswap V3 Mint event ABI definition
/// event Mint(address sender, address indexed owner, int24 indexed tickLower, int24 indexed tickUpper, uint128 amount, uint256 amount0, uint256 amount1)
pub fn mint_event() -> Event {
    Event {
        name: "Mint".to_string(),
        inputs: vec![
            EventParam {
                name: "sender".to_string(),
                kind: ParamType::Address,
                indexed: false,
            },
            EventParam {
                name: "owner".to_string(),
                kind: ParamType::Address,
                indexed: true,
            },
            EventParam {
                name: "tickLower".to_string(),
                kind: ParamType::Int(24),
                indexed: true,
            },
            EventParam {
                name: "tickUpper".to_string(),
                kind: ParamType::Int(24),
                indexed: true,
            },
            EventParam {
                name: "amount".to_string(),
                kind: ParamType::Uint(128),
                indexed: false,
            },
            EventParam {
                name: "amount0".to_string(),
                kind: ParamType::Uint(256),
                indexed: false,
            },
            EventParam {
                name: "amount1".to_string(),
                kind: ParamType::Uint(256),
                indexed: false,
            },
        ],
        anonymous: false,
    }
}

/// Uniswap V3 Burn event ABI definition
/// event Burn(address indexed owner, int24 indexed tickLower, int24 indexed tickUpper, uint128 amount, uint256 amount0, uint256 amount1)
pub fn burn_event() -> Event {
    Event {
        name: "Burn".to_string(),
        inputs: vec![
            EventParam {
                name: "owner".to_string(),
                kind: ParamType::Address,
                indexed: true,
            },
            EventParam {
                name: "tickLower".to_string(),
                kind: ParamType::Int(24),
                indexed: true,
            },
            EventParam {
                name: "tickUpper".to_string(),
                kind: ParamType::Int(24),
                indexed: true,
            },
            EventParam {
                name: "amount".to_string(),
                kind: ParamType::Uint(128),
                indexed: false,
            },
            EventParam {
                name: "amount0".to_string(),
                kind: ParamType::Uint(256),
                indexed: false,
            },
            EventParam {
                name: "amount1".to_string(),
                kind: ParamType::Uint(256),
                indexed: false,
            },
        ],
        anonymous: false,
    }
}

#[allow(deprecated)]
fn view(name: &str, inputs: Vec<ethabi::Param>, outputs: Vec<ethabi::Param>) -> Function {
    Function {
        name: name.to_string(),
        inputs,
        outputs,
        constant: None,
        state_mutability: StateMutability::View,
    }
}

/// function ticks(int24 tick) view returns (uint128 liquidityGross, int128 liquidityNet, ...)
pub fn ticks_function() -> Function {
    view(
        "ticks",
        vec![param("tick", ParamType::Int(24))],
        vec![
            param("liquidityGross", ParamType::Uint(128)),
            param("liquidityNet", ParamType::Int(128)),
        ],
    )
}

/// function liquidity() view returns (uint128)
pub fn liquidity_function() -> Function {
    view("liquidity", vec![], vec![param("", ParamType::Uint(128))])
}

/// function slot0() view returns (uint160 sqrtPriceX96, int24 tick, ...)
pub fn slot0_function() -> Function {
    view(
        "slot0",
        vec![],
        vec![
            param("sqrtPriceX96", ParamType::Uint(160)),
            param("tick", ParamType::Int(24)),
        ],
    )
}

/// function tickSpacing() view returns (int24)
pub fn tick_spacing_function() -> Function {
    view("tickSpacing", vec![], vec![param("", ParamType::Int(24))])
}

/// Liquidity fields of a `ticks(int24)` result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    pub liquidity_gross: u128,
    pub liquidity_net: i128,
}

/// Leading words of a `slot0()` result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
}

/// Call data for `ticks(tick)`
pub fn encode_ticks_call(tick: i32) -> Result<Vec<u8>, DecodingError> {
    ticks_function()
        .encode_input(&[Token::Int(tick_to_u256(tick))])
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))
}

/// Call data for a function without arguments
pub fn encode_no_args(function: &Function) -> Result<Vec<u8>, DecodingError> {
    function
        .encode_input(&[])
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))
}

fn leading_words(data: &[u8], words: usize, field: &str) -> Result<Vec<Token>, DecodingError> {
    if data.len() < words * WORD {
        return Err(DecodingError::MissingField(format!(
            "{field}: return data has {} bytes, need {}",
            data.len(),
            words * WORD
        )));
    }
    // Every leading field is a static 32-byte word, so the raw word suffices
    Ok(data[..words * WORD]
        .chunks(WORD)
        .map(|w| Token::Uint(U256::from_big_endian(w)))
        .collect())
}

fn word_at(tokens: &[Token], index: usize, field: &str) -> Result<U256, DecodingError> {
    tokens
        .get(index)
        .and_then(|t| t.clone().into_uint())
        .ok_or_else(|| DecodingError::MissingField(field.to_string()))
}

/// Decode the liquidity fields of a `ticks(int24)` result
pub fn decode_ticks_output(data: &[u8]) -> Result<TickInfo, DecodingError> {
    let words = leading_words(data, 2, "ticks")?;
    Ok(TickInfo {
        liquidity_gross: safe_u256_to_u128(word_at(&words, 0, "liquidityGross")?)?,
        liquidity_net: u256_to_i128(word_at(&words, 1, "liquidityNet")?)?,
    })
}

/// Decode a `liquidity()` result
pub fn decode_liquidity_output(data: &[u8]) -> Result<u128, DecodingError> {
    let words = leading_words(data, 1, "liquidity")?;
    safe_u256_to_u128(word_at(&words, 0, "liquidity")?)
}

/// Decode the price and current tick of a `slot0()` result
pub fn decode_slot0_output(data: &[u8]) -> Result<Slot0, DecodingError> {
    let words = leading_words(data, 2, "slot0")?;
    let sqrt_price_x96 = word_at(&words, 0, "sqrtPriceX96")?;
    if sqrt_price_x96.bits() > 160 {
        return Err(DecodingError::ValueOverflow {
            value: sqrt_price_x96.to_string(),
        });
    }
    Ok(Slot0 {
        sqrt_price_x96,
        tick: u256_to_tick(word_at(&words, 1, "tick")?)?,
    })
}

/// Decode a `tickSpacing()` result
pub fn decode_tick_spacing_output(data: &[u8]) -> Result<i32, DecodingError> {
    let words = leading_words(data, 1, "tickSpacing")?;
    let spacing = u256_to_tick(word_at(&words, 0, "tickSpacing")?)?;
    if spacing <= 0 {
        return Err(DecodingError::AbiParsingError(format!(
            "non-positive tick spacing {spacing}"
        )));
    }
    Ok(spacing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::conversions::i128_to_u256;

    fn words(values: &[U256]) -> Vec<u8> {
        let tokens: Vec<Token> = values.iter().map(|v| Token::Uint(*v)).collect();
        ethabi::encode(&tokens)
    }

    #[test]
    fn ticks_selector_matches_solidity() {
        // keccak256("ticks(int24)")[..4]
        let data = encode_ticks_call(-60).unwrap();
        assert_eq!(&data[..4], &[0xf3, 0x0d, 0xba, 0x93]);
        assert_eq!(U256::from_big_endian(&data[4..]), tick_to_u256(-60));
    }

    #[test]
    fn view_selectors_match_solidity() {
        assert_eq!(liquidity_function().short_signature(), [0x1a, 0x68, 0x65, 0x02]);
        assert_eq!(slot0_function().short_signature(), [0x38, 0x50, 0xc7, 0xbd]);
        assert_eq!(tick_spacing_function().short_signature(), [0xd0, 0xc9, 0x3a, 0x7c]);
    }

    #[test]
    fn decode_ticks_ignores_trailing_fields() {
        let mut data = words(&[U256::from(500u64), i128_to_u256(-500)]);
        // feeGrowthOutside0X128 .. initialized
        data.extend(words(&[U256::from(7u64); 6]));

        let info = decode_ticks_output(&data).unwrap();
        assert_eq!(info.liquidity_gross, 500);
        assert_eq!(info.liquidity_net, -500);
    }

    #[test]
    fn decode_ticks_rejects_truncated_data() {
        let data = words(&[U256::from(500u64)]);
        assert!(matches!(
            decode_ticks_output(&data),
            Err(DecodingError::MissingField(_))
        ));
    }

    #[test]
    fn decode_slot0_reads_price_and_tick() {
        let price = U256::from(2u64).pow(U256::from(96u64));
        let data = words(&[price, tick_to_u256(-1200), U256::zero(), U256::one()]);

        let slot0 = decode_slot0_output(&data).unwrap();
        assert_eq!(slot0.sqrt_price_x96, price);
        assert_eq!(slot0.tick, -1200);
    }

    #[test]
    fn decode_tick_spacing() {
        assert_eq!(decode_tick_spacing_output(&words(&[U256::from(60u64)])).unwrap(), 60);
        assert!(decode_tick_spacing_output(&words(&[U256::zero()])).is_err());
    }
}
