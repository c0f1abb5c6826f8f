//! Two's-complement conversions between 256-bit ABI words and Rust integers
//!
//! ABI `int24` and `int128` values arrive sign-extended to 256 bits. These
//! helpers narrow them without clamping: an out-of-range word is an error, not
//! a silently saturated tick.

use super::events::DecodingError;
use web3::types::U256;

/// Lowest tick representable by a V3 pool
pub const MIN_TICK: i32 = -887_272;
/// Highest tick representable by a V3 pool
pub const MAX_TICK: i32 = 887_272;

/// Safely convert U256 to u128 with overflow detection
pub fn safe_u256_to_u128(value: U256) -> Result<u128, DecodingError> {
    if value > U256::from(u128::MAX) {
        return Err(DecodingError::ValueOverflow {
            value: format!("{}", value),
        });
    }
    Ok(value.as_u128())
}

/// Interpret a sign-extended word as `int128`
pub fn u256_to_i128(value: U256) -> Result<i128, DecodingError> {
    let narrowed = value.low_u128() as i128;
    // Upper 128 bits must be pure sign extension of the lower half
    let expected_upper = if narrowed < 0 {
        U256::from(u128::MAX)
    } else {
        U256::zero()
    };
    if value >> 128 != expected_upper {
        return Err(DecodingError::ValueOverflow {
            value: format!("{:#x}", value),
        });
    }
    Ok(narrowed)
}

/// Interpret a sign-extended word as a tick index, bounded to [MIN_TICK, MAX_TICK]
pub fn u256_to_tick(value: U256) -> Result<i32, DecodingError> {
    let wide = u256_to_i128(value)?;
    match i32::try_from(wide) {
        Ok(tick) if (MIN_TICK..=MAX_TICK).contains(&tick) => Ok(tick),
        _ => Err(DecodingError::TickOutOfRange(wide)),
    }
}

/// Encode a signed value as a sign-extended 256-bit word
pub fn i128_to_u256(value: i128) -> U256 {
    if value >= 0 {
        U256::from(value as u128)
    } else {
        // -x == !(x - 1) in two's complement
        !U256::from(value.unsigned_abs() - 1)
    }
}

/// Encode a tick index as a sign-extended 256-bit word
pub fn tick_to_u256(tick: i32) -> U256 {
    i128_to_u256(tick as i128)
}
