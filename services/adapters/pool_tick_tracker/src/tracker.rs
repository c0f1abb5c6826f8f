//! PoolTickTracker: the engine's entry points
//!
//! Every call takes the current record by reference and returns a new one;
//! on error the caller keeps the record it has. Calls for one pool address
//! must not overlap, calls for different addresses may.

use crate::assembler::StateAssembler;
use crate::config::TrackerConfig;
use crate::error::Result;
use crate::initializer::FullStateInitializer;
use crate::metrics::{MetricsSnapshot, TrackerMetrics};
use crate::reorg::{LadderOutcome, ReorgHandler};
use crate::rpc_client::ChainClient;
use crate::subgraph::TickIndexClient;
use crate::tick_fetcher::RpcTickFetcher;
use crate::tick_lens::TickLensEnumerator;
use chrono::Utc;
use std::sync::Arc;
use tick_state::{
    resolved_block_number, BlockHeaderLookup, ConsistencyValidator, EntityAdapter, PoolRecord,
    TickSet,
};
use tracing::debug;
use web3::types::Log;

pub struct PoolTickTracker {
    config: Arc<TrackerConfig>,
    metrics: Arc<TrackerMetrics>,
    fetcher: Arc<RpcTickFetcher>,
    reorg: ReorgHandler,
    assembler: Arc<StateAssembler>,
    initializer: FullStateInitializer,
}

impl PoolTickTracker {
    pub fn new(
        config: TrackerConfig,
        client: Arc<dyn ChainClient>,
        index: Option<Arc<dyn TickIndexClient>>,
    ) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let metrics = Arc::new(TrackerMetrics::new());

        let fetcher = Arc::new(RpcTickFetcher::new(
            client.clone(),
            metrics.clone(),
            config.tick_chunk_size,
        ));
        let reorg = ReorgHandler::new(
            fetcher.clone(),
            ConsistencyValidator::new(config.diagnostic_tick_limit),
            metrics.clone(),
            config.dex_id.clone(),
        );
        let assembler = Arc::new(StateAssembler::new(client.clone(), metrics.clone()));

        let tick_lens = if config.tick_lens_address.is_empty() {
            None
        } else {
            Some(TickLensEnumerator::new(
                client.clone(),
                config.tick_lens()?,
                config.tick_lens_word_chunk,
            ))
        };
        let initializer = FullStateInitializer::new(
            client,
            assembler.clone(),
            index,
            tick_lens,
            config.clone(),
            metrics.clone(),
        );

        Ok(Self {
            config,
            metrics,
            fetcher,
            reorg,
            assembler,
            initializer,
        })
    }

    /// Apply one pool's new logs to `record`.
    ///
    /// `logs` must belong to the record's pool. An empty batch returns the
    /// record unchanged without touching the network.
    pub async fn reconcile(
        &self,
        record: &PoolRecord,
        logs: &[Log],
        headers: &dyn BlockHeaderLookup,
    ) -> Result<PoolRecord> {
        if logs.is_empty() {
            return Ok(record.clone());
        }

        let pool = EntityAdapter::pool_address(record)?;
        let tokens = EntityAdapter::token_pair(record)?;
        let ticks = EntityAdapter::tick_set(record)?;
        let block = resolved_block_number(logs);

        let ticks: TickSet = match self.reorg.reconcile(pool, ticks.clone(), logs, block).await? {
            LadderOutcome::Unchanged => ticks,
            LadderOutcome::Accepted { ticks, step } => {
                debug!(dex_id = %self.config.dex_id, pool = %record.address, %step, "Tick map accepted");
                ticks
            }
        };

        let state = self.assembler.fetch(pool, tokens, block).await?;
        let timestamp = StateAssembler::last_activity(record.timestamp, logs, headers);

        Ok(StateAssembler::assemble(
            record,
            &state,
            &ticks,
            record.block_number.max(block),
            timestamp,
        )?)
    }

    /// Full rebuild from the index (or TickLens) plus a latest-block state read
    pub async fn initialize(&self, record: &PoolRecord) -> Result<PoolRecord> {
        self.initializer.initialize(record).await
    }

    /// Re-read every tick the record already knows, at its block number.
    ///
    /// Top-level fields are left as they are.
    pub async fn refresh_ticks(&self, record: &PoolRecord) -> Result<PoolRecord> {
        let mut extra = EntityAdapter::extra(record)?;
        if extra.ticks.is_empty() {
            return Ok(record.clone());
        }

        let pool = EntityAdapter::pool_address(record)?;
        let indices: Vec<i32> = extra.ticks.iter().map(|t| t.index).collect();
        let fetched = self
            .fetcher
            .fetch(pool, &indices, record.block_number)
            .await?;

        let refreshed: TickSet = fetched.into_iter().collect();
        extra.ticks = refreshed.to_sorted_initialized();

        Ok(EntityAdapter::with_snapshot(
            record,
            &extra,
            record.reserves.clone(),
            record.block_number,
            Utc::now().timestamp(),
        )?)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
