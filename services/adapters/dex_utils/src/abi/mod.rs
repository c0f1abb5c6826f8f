//! ABI definitions and codecs for concentrated-liquidity pools
//!
//! This module provides:
//! - Canonical event and function definitions (Uniswap V3 and forks)
//! - Type-safe decoders that reject truncated or overflowing words
//! - Call-data builders for the batched reads issued by the tracker
//!
//! # Supported Contracts
//! - Uniswap V3 pools and compatible forks (Quickswap V3, Pancake V3 slot0 layout)
//! - ERC-20 tokens
//! - Multicall3
//! - Uniswap TickLens

pub mod conversions;
pub mod erc20;
pub mod events;
pub mod multicall;
pub mod tick_lens;
pub mod uniswap_v3;

use ethabi::{Param, ParamType};

pub use events::{DecodingError, LiquidityChange, LiquidityEventDecoder, LiquidityEventKind};

/// Build an unnamed-internal-type function parameter
pub(crate) fn param(name: &str, kind: ParamType) -> Param {
    Param {
        name: name.to_string(),
        kind,
        internal_type: None,
    }
}

