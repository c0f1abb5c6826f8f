//! Liquidity event structures and decoders
//!
//! Provides semantic validation and type-safe decoding of Mint/Burn logs
//! using ethabi, preventing manual byte parsing errors and data truncation.

use super::conversions::u256_to_tick;
use super::uniswap_v3;
use crate::event_signatures::{UNISWAP_V3_BURN, UNISWAP_V3_MINT};
use ethabi::RawLog;
use web3::types::{Log, U256};

/// Error types for ABI decoding
#[derive(Debug, thiserror::Error)]
pub enum DecodingError {
    #[error("Unknown event signature: {0}")]
    UnknownEventSignature(String),

    #[error("ABI parsing failed: {0}")]
    AbiParsingError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Value overflow: {value} does not fit the target integer")]
    ValueOverflow { value: String },

    #[error("Tick {0} outside [-887272, 887272]")]
    TickOutOfRange(i128),
}

/// Which liquidity event produced a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiquidityEventKind {
    Mint,
    Burn,
}

/// Signed liquidity movement on a position's tick range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityChange {
    pub kind: LiquidityEventKind,
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Positive for Mint, negative for Burn
    pub liquidity_delta: i128,
}

impl LiquidityChange {
    /// Both boundary ticks of the position
    pub fn ticks(&self) -> [i32; 2] {
        [self.tick_lower, self.tick_upper]
    }
}

/// ABI decoder for Mint/Burn events
pub struct LiquidityEventDecoder;

impl LiquidityEventDecoder {
    /// Classify a log by topic-0, `None` for anything that is not Mint/Burn
    pub fn classify(log: &Log) -> Option<LiquidityEventKind> {
        match log.topics.first() {
            Some(topic) if *topic == UNISWAP_V3_MINT => Some(LiquidityEventKind::Mint),
            Some(topic) if *topic == UNISWAP_V3_BURN => Some(LiquidityEventKind::Burn),
            _ => None,
        }
    }

    /// Decode a Mint/Burn log into a signed liquidity change.
    ///
    /// Returns `Ok(None)` for logs that carry no liquidity movement: unknown
    /// topics and zero-amount events.
    pub fn decode(log: &Log) -> Result<Option<LiquidityChange>, DecodingError> {
        let Some(kind) = Self::classify(log) else {
            return Ok(None);
        };

        let raw_log = RawLog {
            topics: log.topics.clone(),
            data: log.data.0.clone(),
        };

        // Mint carries a non-indexed sender first; Burn starts at owner
        let (event, first_tick) = match kind {
            LiquidityEventKind::Mint => (uniswap_v3::mint_event(), 2),
            LiquidityEventKind::Burn => (uniswap_v3::burn_event(), 1),
        };

        let decoded = event
            .parse_log(raw_log)
            .map_err(|e| DecodingError::AbiParsingError(e.to_string()))?;

        let tick_lower = decoded
            .params
            .get(first_tick)
            .and_then(|p| p.value.clone().into_int())
            .ok_or(DecodingError::MissingField("tickLower".to_string()))?;

        let tick_upper = decoded
            .params
            .get(first_tick + 1)
            .and_then(|p| p.value.clone().into_int())
            .ok_or(DecodingError::MissingField("tickUpper".to_string()))?;

        let amount = decoded
            .params
            .get(first_tick + 2)
            .and_then(|p| p.value.clone().into_uint())
            .ok_or(DecodingError::MissingField("amount".to_string()))?;

        let magnitude = Self::amount_to_i128(amount)?;
        if magnitude == 0 {
            tracing::debug!(
                tx = ?log.transaction_hash,
                kind = ?kind,
                "Zero-amount liquidity event carries no change"
            );
            return Ok(None);
        }

        Ok(Some(LiquidityChange {
            kind,
            tick_lower: u256_to_tick(tick_lower)?,
            tick_upper: u256_to_tick(tick_upper)?,
            liquidity_delta: match kind {
                LiquidityEventKind::Mint => magnitude,
                LiquidityEventKind::Burn => -magnitude,
            },
        }))
    }

    /// uint128 amounts above i128::MAX cannot be represented as a signed delta
    fn amount_to_i128(amount: U256) -> Result<i128, DecodingError> {
        if amount > U256::from(i128::MAX as u128) {
            tracing::warn!("Liquidity amount overflow: {} > i128::MAX", amount);
            return Err(DecodingError::ValueOverflow {
                value: amount.to_string(),
            });
        }
        Ok(amount.as_u128() as i128)
    }
}
