//! Shared DEX ABI library for concentrated-liquidity pools
//!
//! Single canonical source for the contract surface the tick tracker talks to:
//! pool events it replays and the view functions it batches through Multicall3.
//!
//! # Architecture
//!
//! ```text
//! dex_utils/
//! ├── abi/
//! │   ├── conversions.rs  # two's-complement word <-> int24/int128 helpers
//! │   ├── erc20.rs        # balanceOf
//! │   ├── events.rs       # Mint/Burn -> LiquidityChange decoder
//! │   ├── multicall.rs    # Multicall3 aggregate3 codec
//! │   ├── tick_lens.rs    # TickLens getPopulatedTicksInWord
//! │   └── uniswap_v3.rs   # pool events and view functions
//! └── event_signatures.rs # keccak topic constants
//! ```

pub mod abi;
pub mod event_signatures;

pub use abi::{
    conversions::{safe_u256_to_u128, tick_to_u256, u256_to_i128, u256_to_tick, MAX_TICK, MIN_TICK},
    events::{DecodingError, LiquidityChange, LiquidityEventDecoder, LiquidityEventKind},
    multicall::{MulticallCall, MulticallResult, MULTICALL3_ADDRESS},
    tick_lens::PopulatedTick,
    uniswap_v3::TickInfo,
};

pub use event_signatures::{get_liquidity_signatures, UNISWAP_V3_BURN, UNISWAP_V3_MINT};
