//! Integration tests for the DEX ABI library
//!
//! Exercise decoding against hand-assembled logs shaped exactly as nodes return them.

use dex::abi::*;
use dex::{MulticallCall, UNISWAP_V3_BURN, UNISWAP_V3_MINT};
use ethabi::Token;
use web3::types::{Bytes, Log, H160, H256, U256};

/// Create a test log with the given parameters
fn create_test_log(address: H160, topics: Vec<H256>, data: Vec<u8>) -> Log {
    Log {
        address,
        topics,
        data: Bytes(data),
        block_hash: None,
        block_number: None,
        transaction_hash: None,
        transaction_index: None,
        log_index: None,
        transaction_log_index: None,
        log_type: None,
        removed: None,
    }
}

/// Create H256 from hex string (for test topics)
fn h256_from_hex(hex: &str) -> H256 {
    let bytes = hex::decode(hex.trim_start_matches("0x")).unwrap();
    let mut result = [0u8; 32];
    result[32 - bytes.len()..].copy_from_slice(&bytes);
    H256(result)
}

/// Create H160 from hex string (for addresses)
fn h160_from_hex(hex: &str) -> H160 {
    let bytes = hex::decode(hex.trim_start_matches("0x")).unwrap();
    let mut result = [0u8; 20];
    result[20 - bytes.len()..].copy_from_slice(&bytes);
    H160(result)
}

fn full_range_burn(amount: u64) -> Log {
    let pool = h160_from_hex("0x45dda9cb7c25131df268515131f647d726f50608");
    let owner = h256_from_hex("0xc36442b4a4522e871399cd717abdd847ab11fe88");
    let lower = h256_from_hex("0xfffffffffffffffffffffffffffffffffffffffffffffffffffffffffff2764c");
    let upper = h256_from_hex("0x0d89b4");
    let data = ethabi::encode(&[
        Token::Uint(U256::from(amount)),
        Token::Uint(U256::from(1_000_000u64)),
        Token::Uint(U256::from(2_000_000u64)),
    ]);
    create_test_log(pool, vec![UNISWAP_V3_BURN, owner, lower, upper], data)
}

#[test]
fn test_v3_mint_abi_structure() {
    let event = uniswap_v3::mint_event();

    assert_eq!(event.name, "Mint");
    assert_eq!(event.inputs.len(), 7);
    assert_eq!(event.inputs[1].name, "owner");
    assert_eq!(event.inputs[2].name, "tickLower");
    assert_eq!(event.inputs[3].name, "tickUpper");
    assert_eq!(event.inputs[4].name, "amount");
}

#[test]
fn test_v3_burn_abi_structure() {
    let event = uniswap_v3::burn_event();

    assert_eq!(event.name, "Burn");
    assert_eq!(event.inputs.len(), 6);
    assert!(event.inputs[0].indexed);
    assert_eq!(event.inputs[1].name, "tickLower");
    assert_eq!(event.inputs[3].name, "amount");
    assert!(!event.inputs[3].indexed);
}

#[test]
fn test_full_range_burn_decoding() {
    let change = LiquidityEventDecoder::decode(&full_range_burn(777))
        .expect("burn decodes")
        .expect("burn moves liquidity");

    assert_eq!(change.kind, LiquidityEventKind::Burn);
    assert_eq!(change.tick_lower, -887_220);
    assert_eq!(change.tick_upper, 887_220);
    assert_eq!(change.liquidity_delta, -777);
}

#[test]
fn test_mint_with_negative_upper_tick() {
    let sender = h160_from_hex("0xc36442b4a4522e871399cd717abdd847ab11fe88");
    let lower = h256_from_hex("0xfffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe20");
    let upper = h256_from_hex("0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffc4");
    let data = ethabi::encode(&[
        Token::Address(sender),
        Token::Uint(U256::from(10_000u64)),
        Token::Uint(U256::zero()),
        Token::Uint(U256::from(55u64)),
    ]);
    let log = create_test_log(
        H160::repeat_byte(0x05),
        vec![UNISWAP_V3_MINT, H256::from(sender), lower, upper],
        data,
    );

    let change = LiquidityEventDecoder::decode(&log).unwrap().unwrap();
    assert_eq!(change.kind, LiquidityEventKind::Mint);
    assert_eq!(change.ticks(), [-480, -60]);
    assert_eq!(change.liquidity_delta, 10_000);
}

#[test]
fn test_classify_ignores_swap_logs() {
    let swap = h256_from_hex("0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67");
    let log = create_test_log(H160::repeat_byte(0x05), vec![swap], vec![0u8; 160]);

    assert_eq!(LiquidityEventDecoder::classify(&log), None);
    assert!(LiquidityEventDecoder::decode(&log).unwrap().is_none());
}

#[test]
fn test_missing_topics_fail_decoding() {
    let mut log = full_range_burn(1);
    log.topics.truncate(2);

    assert!(LiquidityEventDecoder::decode(&log).is_err());
}

#[test]
fn test_u128_overflow_handling() {
    let overflow_value = U256::from(u128::MAX) + U256::from(1u64);
    let result = conversions::safe_u256_to_u128(overflow_value);

    assert!(result.is_err());
    match result.unwrap_err() {
        DecodingError::ValueOverflow { value } => {
            assert_eq!(value, "340282366920938463463374607431768211456");
        }
        other => panic!("Expected ValueOverflow error, got {other:?}"),
    }
}

#[test]
fn test_error_types() {
    let missing_field_error = DecodingError::MissingField("test_field".to_string());
    let tick_error = DecodingError::TickOutOfRange(900_000);

    assert!(format!("{}", missing_field_error).contains("test_field"));
    assert!(format!("{}", tick_error).contains("900000"));
}

#[test]
fn test_multicall_wraps_tick_queries() {
    let pool = H160::repeat_byte(0x07);
    let calls: Vec<MulticallCall> = [-60, 0, 60]
        .iter()
        .map(|t| MulticallCall::strict(pool, uniswap_v3::encode_ticks_call(*t).unwrap()))
        .collect();

    let data = multicall::encode_aggregate3(&calls).unwrap();
    assert_eq!(&data[..4], &multicall::aggregate3_function().short_signature());
}
