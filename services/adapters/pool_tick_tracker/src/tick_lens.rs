//! On-chain tick enumeration through the TickLens periphery contract
//!
//! Used for pools the subgraph does not cover. Walks every tick-bitmap word
//! the pool's spacing can address and collects the populated ticks.

use crate::error::RpcError;
use crate::rpc_client::ChainClient;
use dex::{MAX_TICK, MIN_TICK};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tick_state::Tick;
use tracing::debug;
use web3::types::H160;

/// Bitmap words covering every usable tick for `tick_spacing`
pub fn word_range(tick_spacing: i32) -> RangeInclusive<i16> {
    let spacing = tick_spacing.max(1);
    let word = |tick: i32| (tick.div_euclid(spacing) >> 8) as i16;
    word(MIN_TICK)..=word(MAX_TICK)
}

pub struct TickLensEnumerator {
    client: Arc<dyn ChainClient>,
    tick_lens: H160,
    word_chunk: usize,
}

impl TickLensEnumerator {
    pub fn new(client: Arc<dyn ChainClient>, tick_lens: H160, word_chunk: usize) -> Self {
        Self {
            client,
            tick_lens,
            word_chunk: word_chunk.max(1),
        }
    }

    /// All populated ticks of `pool` at the latest block
    pub async fn enumerate(&self, pool: H160) -> Result<Vec<Tick>, RpcError> {
        let spacing = self.client.tick_spacing(pool, 0).await?;
        let words: Vec<i16> = word_range(spacing).collect();

        let mut ticks = Vec::new();
        for chunk in words.chunks(self.word_chunk) {
            let populated = self
                .client
                .populated_ticks(self.tick_lens, pool, chunk)
                .await?;
            ticks.extend(populated.into_iter().map(|p| Tick {
                index: p.tick,
                liquidity_gross: p.liquidity_gross,
                liquidity_net: p.liquidity_net,
            }));
        }

        debug!(
            pool = %format!("0x{}", hex::encode(pool.as_bytes())),
            tick_spacing = spacing,
            words = words.len(),
            ticks = ticks.len(),
            "Enumerated ticks via TickLens"
        );
        Ok(ticks)
    }
}
