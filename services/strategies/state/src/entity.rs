//! EntityAdapter: persisted pool record <-> in-memory tick map
//!
//! The persisted record is opaque to the store: pool-type specific state lives
//! in the JSON `extra` string, which this module owns.

use crate::tick::{decimal_string, Tick, TickSet};
use serde::{Deserialize, Serialize};
use web3::types::{H160, U256};

#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("Malformed pool extra: {0}")]
    MalformedExtra(#[from] serde_json::Error),

    #[error("Invalid address {0:?}")]
    InvalidAddress(String),

    #[error("Invalid decimal value {0:?}")]
    InvalidDecimal(String),
}

/// Token leg of a pool
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolToken {
    pub address: String,
    #[serde(default)]
    pub decimals: u8,
}

/// Keyed record persisted per pool address
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRecord {
    pub address: String,
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub tokens: Vec<PoolToken>,
    /// Display-only token balances of the pool, base-10
    #[serde(default)]
    pub reserves: Vec<String>,
    /// JSON-encoded [`PoolExtra`]; empty before the first initialization
    #[serde(default)]
    pub extra: String,
    #[serde(default)]
    pub block_number: u64,
    /// Last observed activity, unix seconds
    #[serde(default)]
    pub timestamp: i64,
}

/// Concentrated-liquidity state carried in `PoolRecord::extra`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolExtra {
    /// Active liquidity at the current price
    #[serde(with = "decimal_string::unsigned")]
    pub liquidity: u128,
    #[serde(with = "u256_decimal")]
    pub sqrt_price_x96: U256,
    pub tick_spacing: i32,
    pub tick: i32,
    /// Initialized ticks, ascending by index
    pub ticks: Vec<Tick>,
}

mod u256_decimal {
    use serde::{Deserialize, Deserializer, Serializer};
    use web3::types::U256;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_dec_str(&raw).map_err(|e| serde::de::Error::custom(format!("{e:?}")))
    }
}

impl PoolExtra {
    /// Build the persisted form, pruning zero-gross ticks and sorting by index
    pub fn new(
        liquidity: u128,
        sqrt_price_x96: U256,
        tick_spacing: i32,
        tick: i32,
        ticks: &TickSet,
    ) -> Self {
        Self {
            liquidity,
            sqrt_price_x96,
            tick_spacing,
            tick,
            ticks: ticks.to_sorted_initialized(),
        }
    }
}

pub struct EntityAdapter;

impl EntityAdapter {
    /// Decode `extra`; an empty string is a pool that was never initialized
    pub fn extra(record: &PoolRecord) -> Result<PoolExtra, EntityError> {
        if record.extra.trim().is_empty() {
            return Ok(PoolExtra::default());
        }
        Ok(serde_json::from_str(&record.extra)?)
    }

    /// Working tick map for a record
    pub fn tick_set(record: &PoolRecord) -> Result<TickSet, EntityError> {
        Ok(Self::extra(record)?.ticks.into_iter().collect())
    }

    pub fn encode_extra(extra: &PoolExtra) -> Result<String, EntityError> {
        Ok(serde_json::to_string(extra)?)
    }

    pub fn pool_address(record: &PoolRecord) -> Result<H160, EntityError> {
        parse_address(&record.address)
    }

    /// Token pair used for reserve reads, only when exactly two tokens are configured
    pub fn token_pair(record: &PoolRecord) -> Result<Option<(H160, H160)>, EntityError> {
        match record.tokens.as_slice() {
            [a, b] => Ok(Some((parse_address(&a.address)?, parse_address(&b.address)?))),
            _ => Ok(None),
        }
    }

    /// Copy of `record` carrying a new snapshot
    pub fn with_snapshot(
        record: &PoolRecord,
        extra: &PoolExtra,
        reserves: Vec<String>,
        block_number: u64,
        timestamp: i64,
    ) -> Result<PoolRecord, EntityError> {
        Ok(PoolRecord {
            extra: Self::encode_extra(extra)?,
            reserves,
            block_number,
            timestamp,
            ..record.clone()
        })
    }
}

/// Parse a 0x-prefixed (or bare) 20-byte hex address
pub fn parse_address(raw: &str) -> Result<H160, EntityError> {
    let trimmed = raw.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(hex_part).map_err(|_| EntityError::InvalidAddress(raw.to_string()))?;
    if bytes.len() != 20 {
        return Err(EntityError::InvalidAddress(raw.to_string()));
    }
    Ok(H160::from_slice(&bytes))
}

/// Parse a base-10 u128 as persisted in records
pub fn parse_decimal_u128(raw: &str) -> Result<u128, EntityError> {
    raw.trim()
        .parse()
        .map_err(|_| EntityError::InvalidDecimal(raw.to_string()))
}

/// Parse a base-10 i128 as persisted in records
pub fn parse_decimal_i128(raw: &str) -> Result<i128, EntityError> {
    raw.trim()
        .parse()
        .map_err(|_| EntityError::InvalidDecimal(raw.to_string()))
}
