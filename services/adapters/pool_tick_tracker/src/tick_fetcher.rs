//! Authoritative tick re-fetch
//!
//! Indices are read in fixed-size chunks, one batched call per chunk, strictly
//! in sequence. Any chunk failure abandons the whole fetch; on a pruned
//! historical block the whole fetch restarts once at latest.

use crate::error::RpcError;
use crate::metrics::TrackerMetrics;
use crate::rpc_client::{with_latest_fallback, ChainClient};
use std::sync::Arc;
use tick_state::Tick;
use tracing::debug;
use web3::types::H160;

pub struct RpcTickFetcher {
    client: Arc<dyn ChainClient>,
    metrics: Arc<TrackerMetrics>,
    chunk_size: usize,
}

impl RpcTickFetcher {
    pub fn new(client: Arc<dyn ChainClient>, metrics: Arc<TrackerMetrics>, chunk_size: usize) -> Self {
        Self {
            client,
            metrics,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Ticks for `indices` at `block` (0 = latest), in input order
    pub async fn fetch(&self, pool: H160, indices: &[i32], block: u64) -> Result<Vec<Tick>, RpcError> {
        if indices.is_empty() {
            return Ok(Vec::new());
        }
        with_latest_fallback(pool, block, &self.metrics, |b| self.fetch_at(pool, indices, b)).await
    }

    async fn fetch_at(&self, pool: H160, indices: &[i32], block: u64) -> Result<Vec<Tick>, RpcError> {
        let mut ticks = Vec::with_capacity(indices.len());
        for chunk in indices.chunks(self.chunk_size) {
            let fetched = self.client.ticks(pool, chunk, block).await?;
            if fetched.len() != chunk.len() {
                return Err(RpcError::Decode(format!(
                    "requested {} ticks, node returned {}",
                    chunk.len(),
                    fetched.len()
                )));
            }
            ticks.extend(fetched);
        }

        debug!(
            pool = %format!("0x{}", hex::encode(pool.as_bytes())),
            block,
            count = ticks.len(),
            "Fetched ticks"
        );
        Ok(ticks)
    }
}
