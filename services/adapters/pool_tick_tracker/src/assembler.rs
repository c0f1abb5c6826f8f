//! StateAssembler: top-level pool fields and the persisted snapshot

use crate::error::RpcError;
use crate::metrics::TrackerMetrics;
use crate::rpc_client::{with_latest_fallback, ChainClient, PoolRpcState};
use std::sync::Arc;
use tick_state::logs::block_number;
use tick_state::{
    latest_activity_log, BlockHeaderLookup, EntityAdapter, EntityError, PoolExtra, PoolRecord,
    TickSet,
};
use web3::types::{Log, H160};

pub struct StateAssembler {
    client: Arc<dyn ChainClient>,
    metrics: Arc<TrackerMetrics>,
}

impl StateAssembler {
    pub fn new(client: Arc<dyn ChainClient>, metrics: Arc<TrackerMetrics>) -> Self {
        Self { client, metrics }
    }

    /// Liquidity, price, spacing and reserves at `block`, falling back to latest if pruned
    pub async fn fetch(
        &self,
        pool: H160,
        tokens: Option<(H160, H160)>,
        block: u64,
    ) -> Result<PoolRpcState, RpcError> {
        with_latest_fallback(pool, block, &self.metrics, |b| {
            self.client.pool_state(pool, tokens, b)
        })
        .await
    }

    /// New record carrying `ticks` and `state`; everything else is copied from `record`
    pub fn assemble(
        record: &PoolRecord,
        state: &PoolRpcState,
        ticks: &TickSet,
        block_number: u64,
        timestamp: i64,
    ) -> Result<PoolRecord, EntityError> {
        let extra = PoolExtra::new(
            state.liquidity,
            state.sqrt_price_x96,
            state.tick_spacing,
            state.tick,
            ticks,
        );
        EntityAdapter::with_snapshot(
            record,
            &extra,
            state.reserves.to_vec(),
            block_number,
            timestamp,
        )
    }

    /// `max(previous, header timestamp of the latest real log)`.
    ///
    /// Wake logs, reverted logs and blocks without a known header leave
    /// `previous` as is.
    pub fn last_activity(previous: i64, logs: &[Log], headers: &dyn BlockHeaderLookup) -> i64 {
        latest_activity_log(logs)
            .and_then(|log| headers.header(block_number(log)))
            .and_then(|header| i64::try_from(header.timestamp).ok())
            .map_or(previous, |ts| ts.max(previous))
    }
}
