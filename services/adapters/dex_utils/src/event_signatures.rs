//! Liquidity event signature constants
//!
//! keccak256 hashes of the canonical Solidity event definitions the tick
//! tracker replays. Used for `eth_getLogs` topic filters and to route logs to
//! the right decoder without rebuilding the ethabi `Event` on every log.

use web3::types::H256;

// =============================================================================
// Uniswap V3 Liquidity Event Signatures
// =============================================================================

/// Uniswap V3 Mint event signature
/// `Mint(address sender, address indexed owner, int24 indexed tickLower, int24 indexed tickUpper, uint128 amount, uint256 amount0, uint256 amount1)`
/// keccak256("Mint(address,address,int24,int24,uint128,uint256,uint256)")
pub const UNISWAP_V3_MINT: H256 = H256([
    0x7a, 0x53, 0x08, 0x0b, 0xa4, 0x14, 0x15, 0x8b, 0xe7, 0xec, 0x69, 0xb9, 0x87, 0xb5, 0xfb, 0x7d,
    0x07, 0xde, 0xe1, 0x01, 0xfe, 0x85, 0x48, 0x8f, 0x08, 0x53, 0xae, 0x16, 0x23, 0x9d, 0x0b, 0xde,
]);

/// Uniswap V3 Burn event signature
/// `Burn(address indexed owner, int24 indexed tickLower, int24 indexed tickUpper, uint128 amount, uint256 amount0, uint256 amount1)`
/// keccak256("Burn(address,int24,int24,uint128,uint256,uint256)")
pub const UNISWAP_V3_BURN: H256 = H256([
    0x0c, 0x39, 0x6c, 0xd9, 0x89, 0xa3, 0x9f, 0x44, 0x59, 0xb5, 0xfa, 0x1a, 0xed, 0x6a, 0x9a, 0x8d,
    0xcd, 0xbc, 0x45, 0x90, 0x8a, 0xcf, 0xd6, 0x7e, 0x02, 0x8c, 0xd5, 0x68, 0xda, 0x98, 0x98, 0x2c,
]);

/// Mint/burn signatures, in the order a topic-0 filter expects them
pub const fn get_liquidity_signatures() -> [H256; 2] {
    [UNISWAP_V3_MINT, UNISWAP_V3_BURN]
}
