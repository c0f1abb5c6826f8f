//! TickReconciler: replay Mint/Burn logs onto a tick map
//!
//! Pure and infallible. Decode failures on individual logs are absorbed and
//! counted; escalation decisions belong to the caller.

use crate::logs::{is_wake_log, sorted_logs};
use crate::tick::TickSet;
use dex::LiquidityEventDecoder;
use std::collections::BTreeSet;
use tracing::{debug, error};
use web3::types::Log;

/// Result of replaying a batch
#[derive(Debug, Clone, Default)]
pub struct ReplayOutcome {
    pub ticks: TickSet,
    /// Every index a decoded event moved
    pub touched: BTreeSet<i32>,
    /// Indices whose arithmetic left gross negative or overflowed
    pub invalid: BTreeSet<i32>,
    /// Logs dropped because they failed to decode
    pub skipped: usize,
}

impl ReplayOutcome {
    pub fn is_untouched(&self) -> bool {
        self.touched.is_empty()
    }
}

pub struct TickReconciler;

impl TickReconciler {
    /// Apply `logs` in `(blockNumber, logIndex)` order on top of `ticks`
    pub fn replay(ticks: TickSet, logs: &[Log]) -> ReplayOutcome {
        let mut outcome = ReplayOutcome {
            ticks,
            ..ReplayOutcome::default()
        };

        for log in sorted_logs(logs) {
            if is_wake_log(log) {
                continue;
            }

            let change = match LiquidityEventDecoder::decode(log) {
                Ok(Some(change)) => change,
                Ok(None) => continue,
                Err(e) => {
                    error!(
                        pool = %format!("0x{}", hex::encode(log.address.as_bytes())),
                        tx = ?log.transaction_hash,
                        error = %e,
                        "Skipping undecodable liquidity log"
                    );
                    outcome.skipped += 1;
                    continue;
                }
            };

            let delta = change.liquidity_delta;
            for (index, is_lower) in [(change.tick_lower, true), (change.tick_upper, false)] {
                if !outcome.ticks.apply_liquidity_change(index, delta, is_lower) {
                    outcome.invalid.insert(index);
                }
                outcome.touched.insert(index);
            }
        }

        debug!(
            touched = outcome.touched.len(),
            invalid = outcome.invalid.len(),
            skipped = outcome.skipped,
            "Replayed liquidity logs"
        );
        outcome
    }

    /// Every tick index implicated by the batch, including reverted logs
    pub fn affected_indices(logs: &[Log]) -> BTreeSet<i32> {
        let mut affected = BTreeSet::new();
        for log in logs {
            if is_wake_log(log) {
                continue;
            }
            match LiquidityEventDecoder::decode(log) {
                Ok(Some(change)) => affected.extend(change.ticks()),
                Ok(None) => {}
                Err(e) => {
                    error!(
                        tx = ?log.transaction_hash,
                        error = %e,
                        "Skipping undecodable log while collecting affected ticks"
                    );
                }
            }
        }
        affected
    }
}
