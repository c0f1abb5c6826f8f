//! Uniswap TickLens periphery contract
//!
//! `getPopulatedTicksInWord` returns every initialized tick inside one 256-bit
//! word of a pool's tick bitmap, which lets a full tick set be enumerated from
//! a node without an indexer.

use super::conversions::{i128_to_u256, safe_u256_to_u128, u256_to_i128, u256_to_tick};
use super::events::DecodingError;
use super::param;
use ethabi::{Function, ParamType, StateMutability, Token};
use web3::types::H160;

/// One entry of a `getPopulatedTicksInWord` result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulatedTick {
    pub tick: i32,
    pub liquidity_net: i128,
    pub liquidity_gross: u128,
}

fn populated_tick_kind() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::Int(24),
        ParamType::Int(128),
        ParamType::Uint(128),
    ])
}

/// function getPopulatedTicksInWord(address pool, int16 tickBitmapIndex)
///     view returns ((int24 tick, int128 liquidityNet, uint128 liquidityGross)[])
#[allow(deprecated)]
pub fn get_populated_ticks_in_word_function() -> Function {
    Function {
        name: "getPopulatedTicksInWord".to_string(),
        inputs: vec![
            param("pool", ParamType::Address),
            param("tickBitmapIndex", ParamType::Int(16)),
        ],
        outputs: vec![param(
            "populatedTicks",
            ParamType::Array(Box::new(populated_tick_kind())),
        )],
        constant: None,
        state_mutability: StateMutability::View,
    }
}

/// Call data for one bitmap word of `pool`
pub fn encode_populated_ticks_call(pool: H160, word: i16) -> Result<Vec<u8>, DecodingError> {
    get_populated_ticks_in_word_function()
        .encode_input(&[
            Token::Address(pool),
            Token::Int(i128_to_u256(word as i128)),
        ])
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))
}

/// Decode a `getPopulatedTicksInWord` result
pub fn decode_populated_ticks(data: &[u8]) -> Result<Vec<PopulatedTick>, DecodingError> {
    let entries = get_populated_ticks_in_word_function()
        .decode_output(data)
        .map_err(|e| DecodingError::AbiParsingError(e.to_string()))?
        .into_iter()
        .next()
        .and_then(|t| t.into_array())
        .ok_or_else(|| DecodingError::MissingField("populatedTicks".to_string()))?;

    entries
        .into_iter()
        .map(|entry| {
            let fields = entry
                .into_tuple()
                .ok_or_else(|| DecodingError::MissingField("populated tick".to_string()))?;
            let int_at = |i: usize, name: &str| {
                fields
                    .get(i)
                    .and_then(|t| t.clone().into_int())
                    .ok_or_else(|| DecodingError::MissingField(name.to_string()))
            };
            let gross = fields
                .get(2)
                .and_then(|t| t.clone().into_uint())
                .ok_or_else(|| DecodingError::MissingField("liquidityGross".to_string()))?;
            Ok(PopulatedTick {
                tick: u256_to_tick(int_at(0, "tick")?)?,
                liquidity_net: u256_to_i128(int_at(1, "liquidityNet")?)?,
                liquidity_gross: safe_u256_to_u128(gross)?,
            })
        })
        .collect()
}
