//! Escalation ladder for incremental reconciliation
//!
//! ```text
//! REPLAY ──invalid──> NARROW_REFETCH ──invalid──> FULL_REFETCH ──invalid──> fail
//!   │                      ▲    │                       │
//!   │ reorg marker ────────┘    └──valid──> accept <────┘──valid
//!   └──valid──> accept (no network)
//! ```
//!
//! Replay is trusted only when no tick went negative and net liquidity still
//! sums to zero. Each refetch overlays chain values on the working map.

use crate::error::{Result, TrackerError};
use crate::metrics::TrackerMetrics;
use crate::tick_fetcher::RpcTickFetcher;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tick_state::{has_reverted_log, ConsistencyValidator, TickReconciler, TickSet};
use tracing::{debug, error, info, warn};
use web3::types::{Log, H160};

/// Ladder step that produced an accepted tick map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderStep {
    Replay,
    NarrowRefetch,
    FullRefetch,
}

impl fmt::Display for LadderStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LadderStep::Replay => "replay",
            LadderStep::NarrowRefetch => "narrow_refetch",
            LadderStep::FullRefetch => "full_refetch",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub enum LadderOutcome {
    /// No tick was touched by the batch
    Unchanged,
    Accepted { ticks: TickSet, step: LadderStep },
}

pub struct ReorgHandler {
    fetcher: Arc<RpcTickFetcher>,
    validator: ConsistencyValidator,
    metrics: Arc<TrackerMetrics>,
    dex_id: String,
}

impl ReorgHandler {
    pub fn new(
        fetcher: Arc<RpcTickFetcher>,
        validator: ConsistencyValidator,
        metrics: Arc<TrackerMetrics>,
        dex_id: String,
    ) -> Self {
        Self {
            fetcher,
            validator,
            metrics,
            dex_id,
        }
    }

    /// Run the ladder for one pool's batch; `block` is the call's resolved block
    pub async fn reconcile(
        &self,
        pool: H160,
        ticks: TickSet,
        logs: &[Log],
        block: u64,
    ) -> Result<LadderOutcome> {
        let pool_hex = format!("0x{}", hex::encode(pool.as_bytes()));

        if has_reverted_log(logs) {
            let affected = TickReconciler::affected_indices(logs);
            warn!(
                dex_id = %self.dex_id,
                pool = %pool_hex,
                block,
                affected = affected.len(),
                "Reorg marker in batch, skipping replay"
            );
            if affected.is_empty() {
                return Ok(LadderOutcome::Unchanged);
            }
            return self.narrow_refetch(pool, ticks, &affected, block).await;
        }

        let outcome = TickReconciler::replay(ticks.clone(), logs);
        self.metrics.record_skipped_logs(outcome.skipped);

        if outcome.is_untouched() {
            debug!(dex_id = %self.dex_id, pool = %pool_hex, "Batch touched no ticks");
            return Ok(LadderOutcome::Unchanged);
        }

        if outcome.invalid.is_empty() && ConsistencyValidator::has_valid_ticks(&outcome.ticks) {
            self.metrics.record_replay_accept();
            debug!(
                dex_id = %self.dex_id,
                pool = %pool_hex,
                block,
                affected = outcome.touched.len(),
                "Replay accepted"
            );
            return Ok(LadderOutcome::Accepted {
                ticks: outcome.ticks,
                step: LadderStep::Replay,
            });
        }

        info!(
            dex_id = %self.dex_id,
            pool = %pool_hex,
            block,
            affected = outcome.touched.len(),
            invalid = outcome.invalid.len(),
            "Replay failed validation"
        );

        // Refetched values replace every touched tick, so the pre-replay map is the base
        let implicated: BTreeSet<i32> = outcome.touched.union(&outcome.invalid).copied().collect();
        self.narrow_refetch(pool, ticks, &implicated, block).await
    }

    async fn narrow_refetch(
        &self,
        pool: H160,
        mut ticks: TickSet,
        affected: &BTreeSet<i32>,
        block: u64,
    ) -> Result<LadderOutcome> {
        self.metrics.record_narrow_refetch();
        let indices: Vec<i32> = affected.iter().copied().collect();
        let fetched = self.fetcher.fetch(pool, &indices, block).await?;

        match self.validator.validate_pool_ticks(&ticks, &fetched) {
            Ok(()) => {
                ticks.overlay(fetched);
                info!(
                    dex_id = %self.dex_id,
                    pool = %format!("0x{}", hex::encode(pool.as_bytes())),
                    block,
                    affected = indices.len(),
                    "Narrow refetch accepted"
                );
                Ok(LadderOutcome::Accepted {
                    ticks,
                    step: LadderStep::NarrowRefetch,
                })
            }
            Err(e) => {
                warn!(
                    dex_id = %self.dex_id,
                    pool = %format!("0x{}", hex::encode(pool.as_bytes())),
                    block,
                    error = %e,
                    "Narrow refetch still inconsistent, refetching every known tick"
                );
                ticks.overlay(fetched);
                self.full_refetch(pool, ticks, block).await
            }
        }
    }

    async fn full_refetch(&self, pool: H160, mut ticks: TickSet, block: u64) -> Result<LadderOutcome> {
        self.metrics.record_full_refetch();
        let indices = ticks.indices();
        let fetched = self.fetcher.fetch(pool, &indices, block).await?;
        ticks.overlay(fetched);

        if ConsistencyValidator::has_all_valid_ticks(&ticks) {
            info!(
                dex_id = %self.dex_id,
                pool = %format!("0x{}", hex::encode(pool.as_bytes())),
                block,
                tick_count = indices.len(),
                "Full refetch accepted"
            );
            return Ok(LadderOutcome::Accepted {
                ticks,
                step: LadderStep::FullRefetch,
            });
        }

        self.metrics.record_terminal_failure();
        error!(
            dex_id = %self.dex_id,
            pool = %format!("0x{}", hex::encode(pool.as_bytes())),
            block,
            tick_count = indices.len(),
            "Tick map inconsistent after full refetch, keeping previous snapshot"
        );
        Err(TrackerError::InconsistentTicks {
            block,
            tick_count: indices.len(),
        })
    }
}
