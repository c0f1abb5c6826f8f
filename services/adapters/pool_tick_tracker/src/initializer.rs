//! FullStateInitializer: cold start without log history
//!
//! Top-level state and the complete tick list are fetched concurrently; the
//! first failure drops the sibling future and nothing is assembled.

use crate::assembler::StateAssembler;
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::metrics::TrackerMetrics;
use crate::rpc_client::ChainClient;
use crate::subgraph::{fetch_all_ticks, TickIndexClient};
use crate::tick_lens::TickLensEnumerator;
use chrono::Utc;
use std::sync::Arc;
use tick_state::{ConsistencyValidator, EntityAdapter, PoolRecord, Tick, TickSet};
use tracing::{info, warn};
use web3::types::H160;

/// Where the complete tick list comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSource {
    Subgraph,
    TickLens,
}

pub struct FullStateInitializer {
    client: Arc<dyn ChainClient>,
    assembler: Arc<StateAssembler>,
    index: Option<Arc<dyn TickIndexClient>>,
    tick_lens: Option<TickLensEnumerator>,
    config: Arc<TrackerConfig>,
    metrics: Arc<TrackerMetrics>,
}

impl FullStateInitializer {
    pub fn new(
        client: Arc<dyn ChainClient>,
        assembler: Arc<StateAssembler>,
        index: Option<Arc<dyn TickIndexClient>>,
        tick_lens: Option<TickLensEnumerator>,
        config: Arc<TrackerConfig>,
        metrics: Arc<TrackerMetrics>,
    ) -> Self {
        Self {
            client,
            assembler,
            index,
            tick_lens,
            config,
            metrics,
        }
    }

    /// TickLens for pools the index cannot serve, the subgraph otherwise
    pub fn tick_source(&self, pool_address: &str) -> TickSource {
        if self.config.always_use_tick_lens
            || self.config.is_pre_genesis(pool_address)
            || self.index.is_none()
        {
            TickSource::TickLens
        } else {
            TickSource::Subgraph
        }
    }

    pub async fn initialize(&self, record: &PoolRecord) -> Result<PoolRecord> {
        let pool = EntityAdapter::pool_address(record)?;
        let tokens = EntityAdapter::token_pair(record)?;
        let block_number = self.client.block_number().await?;

        let (state, ticks) = tokio::try_join!(
            async {
                self.assembler
                    .fetch(pool, tokens, 0)
                    .await
                    .map_err(TrackerError::from)
            },
            self.enumerate_ticks(&record.address, pool),
        )?;

        let tick_set: TickSet = ticks.into_iter().collect();
        if !ConsistencyValidator::has_valid_ticks(&tick_set) {
            warn!(
                dex_id = %self.config.dex_id,
                pool = %record.address,
                tick_count = tick_set.len(),
                net_sum = ?tick_set.net_sum(),
                "Enumerated ticks do not sum to zero"
            );
        }

        let updated = StateAssembler::assemble(
            record,
            &state,
            &tick_set,
            block_number,
            Utc::now().timestamp(),
        )?;

        self.metrics.record_initialization();
        info!(
            dex_id = %self.config.dex_id,
            pool = %record.address,
            block = block_number,
            tick_count = tick_set.len(),
            "Initialized pool state"
        );
        Ok(updated)
    }

    async fn enumerate_ticks(&self, pool_address: &str, pool: H160) -> Result<Vec<Tick>> {
        match (self.tick_source(pool_address), &self.index) {
            (TickSource::Subgraph, Some(index)) => Ok(fetch_all_ticks(
                index.as_ref(),
                pool_address,
                self.config.subgraph_page_size,
                self.config.allow_subgraph_error,
            )
            .await?),
            _ => {
                let enumerator = self.tick_lens.as_ref().ok_or_else(|| {
                    TrackerError::Configuration(format!(
                        "pool {pool_address} needs TickLens but no tick_lens_address is configured"
                    ))
                })?;
                Ok(enumerator.enumerate(pool).await?)
            }
        }
    }
}
