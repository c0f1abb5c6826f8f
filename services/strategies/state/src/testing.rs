//! Log and tick builders shared by unit tests

use crate::tick::Tick;
use dex::abi::conversions::tick_to_u256;
use dex::{UNISWAP_V3_BURN, UNISWAP_V3_MINT};
use ethabi::Token;
use web3::types::{Bytes, Log, H160, H256, U256, U64};

pub fn tick(index: i32, gross: u128, net: i128) -> Tick {
    Tick {
        index,
        liquidity_gross: gross,
        liquidity_net: net,
    }
}

fn topic_for_tick(tick: i32) -> H256 {
    let mut buf = [0u8; 32];
    tick_to_u256(tick).to_big_endian(&mut buf);
    H256(buf)
}

fn pool_log(block: u64, index: u64, topics: Vec<H256>, data: Vec<u8>) -> Log {
    Log {
        address: H160::repeat_byte(0x45),
        topics,
        data: Bytes(data),
        block_hash: None,
        block_number: Some(U64::from(block)),
        transaction_hash: None,
        transaction_index: None,
        log_index: Some(U256::from(index)),
        transaction_log_index: None,
        log_type: None,
        removed: Some(false),
    }
}

pub fn mint_log(block: u64, index: u64, lower: i32, upper: i32, amount: u128) -> Log {
    let data = ethabi::encode(&[
        Token::Address(H160::repeat_byte(0x0a)),
        Token::Uint(U256::from(amount)),
        Token::Uint(U256::zero()),
        Token::Uint(U256::zero()),
    ]);
    let topics = vec![
        UNISWAP_V3_MINT,
        H256::from(H160::repeat_byte(0x0b)),
        topic_for_tick(lower),
        topic_for_tick(upper),
    ];
    pool_log(block, index, topics, data)
}

pub fn burn_log(block: u64, index: u64, lower: i32, upper: i32, amount: u128) -> Log {
    let data = ethabi::encode(&[
        Token::Uint(U256::from(amount)),
        Token::Uint(U256::zero()),
        Token::Uint(U256::zero()),
    ]);
    let topics = vec![
        UNISWAP_V3_BURN,
        H256::from(H160::repeat_byte(0x0b)),
        topic_for_tick(lower),
        topic_for_tick(upper),
    ];
    pool_log(block, index, topics, data)
}
