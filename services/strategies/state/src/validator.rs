//! ConsistencyValidator: zero-sum checks over a tick map
//!
//! Every position contributes `+delta` at its lower tick and `-delta` at its
//! upper tick, so the net liquidity of a complete tick map sums to zero. The
//! check is necessary but not sufficient: two compensating errors on unrelated
//! ticks pass.

use crate::tick::{Tick, TickSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::error;

static TERMINAL_VALIDATION_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Process-wide count of failed terminal validations
pub fn terminal_validation_failures() -> u64 {
    TERMINAL_VALIDATION_FAILURES.load(Ordering::Relaxed)
}

/// Before/after view of one candidate tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickChange {
    pub index: i32,
    pub before: Option<Tick>,
    pub after: Tick,
}

impl fmt::Display for TickChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.before {
            Some(b) => write!(
                f,
                "{}: gross {} -> {}, net {} -> {}",
                self.index,
                b.liquidity_gross,
                self.after.liquidity_gross,
                b.liquidity_net,
                self.after.liquidity_net
            ),
            None => write!(
                f,
                "{}: new gross {}, net {}",
                self.index, self.after.liquidity_gross, self.after.liquidity_net
            ),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TickValidationError {
    #[error(
        "net liquidity does not sum to zero after overlaying {candidate_count} ticks \
         (before {before:?}, after {after:?}){}",
        format_changes(.changes)
    )]
    NonZeroNetSum {
        /// `None` when the sum overflowed i128
        before: Option<i128>,
        after: Option<i128>,
        candidate_count: usize,
        /// Empty when the candidate count exceeds the diagnostic limit
        changes: Vec<TickChange>,
    },
}

fn format_changes(changes: &[TickChange]) -> String {
    if changes.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = changes.iter().map(ToString::to_string).collect();
    format!(": [{}]", rendered.join("; "))
}

#[derive(Debug, Clone, Copy)]
pub struct ConsistencyValidator {
    diagnostic_tick_limit: usize,
}

impl Default for ConsistencyValidator {
    fn default() -> Self {
        Self {
            diagnostic_tick_limit: 10,
        }
    }
}

impl ConsistencyValidator {
    pub fn new(diagnostic_tick_limit: usize) -> Self {
        Self {
            diagnostic_tick_limit,
        }
    }

    /// True iff net liquidity sums to exactly zero
    pub fn has_valid_ticks(ticks: &TickSet) -> bool {
        ticks.net_sum() == Some(0)
    }

    /// `has_valid_ticks` for terminal checkpoints; failures are counted and logged
    pub fn has_all_valid_ticks(ticks: &TickSet) -> bool {
        if Self::has_valid_ticks(ticks) {
            return true;
        }
        let total = TERMINAL_VALIDATION_FAILURES.fetch_add(1, Ordering::Relaxed) + 1;
        error!(
            tick_count = ticks.len(),
            net_sum = ?ticks.net_sum(),
            total_failures = total,
            "Tick map failed terminal zero-sum validation"
        );
        false
    }

    /// Check `candidates` overlaid on `ticks` without mutating `ticks`
    pub fn validate_pool_ticks(
        &self,
        ticks: &TickSet,
        candidates: &[Tick],
    ) -> Result<(), TickValidationError> {
        let mut merged = ticks.clone();
        merged.overlay(candidates.iter().copied());
        if Self::has_valid_ticks(&merged) {
            return Ok(());
        }

        let changes = if candidates.len() <= self.diagnostic_tick_limit {
            candidates
                .iter()
                .map(|c| TickChange {
                    index: c.index,
                    before: ticks.get(c.index).copied(),
                    after: *c,
                })
                .collect()
        } else {
            Vec::new()
        };

        Err(TickValidationError::NonZeroNetSum {
            before: ticks.net_sum(),
            after: merged.net_sum(),
            candidate_count: candidates.len(),
            changes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::tick;

    fn balanced() -> TickSet {
        [tick(-10, 5, 5), tick(10, 5, -5)].into_iter().collect()
    }

    #[test]
    fn zero_sum_is_valid() {
        assert!(ConsistencyValidator::has_valid_ticks(&balanced()));
        assert!(ConsistencyValidator::has_valid_ticks(&TickSet::new()));
    }

    #[test]
    fn drift_is_invalid() {
        let mut set = balanced();
        set.insert(tick(20, 1, 1));
        assert!(!ConsistencyValidator::has_valid_ticks(&set));
    }

    #[test]
    fn terminal_failure_bumps_counter() {
        let before = terminal_validation_failures();
        let set: TickSet = [tick(1, 1, 1)].into_iter().collect();

        assert!(!ConsistencyValidator::has_all_valid_ticks(&set));
        assert!(terminal_validation_failures() > before);
        assert!(ConsistencyValidator::has_all_valid_ticks(&balanced()));
    }

    #[test]
    fn validate_does_not_mutate() {
        let set = balanced();
        let validator = ConsistencyValidator::new(10);

        let err = validator
            .validate_pool_ticks(&set, &[tick(10, 5, -4)])
            .unwrap_err();
        assert_eq!(set, balanced());

        let TickValidationError::NonZeroNetSum {
            before,
            after,
            candidate_count,
            changes,
        } = err;
        assert_eq!(before, Some(0));
        assert_eq!(after, Some(1));
        assert_eq!(candidate_count, 1);
        assert_eq!(
            changes,
            vec![TickChange {
                index: 10,
                before: Some(tick(10, 5, -5)),
                after: tick(10, 5, -4),
            }]
        );
    }

    #[test]
    fn diagnostic_dump_is_bounded() {
        let validator = ConsistencyValidator::new(2);
        let candidates = [tick(1, 1, 1), tick(2, 1, 1), tick(3, 1, 1)];

        let err = validator
            .validate_pool_ticks(&TickSet::new(), &candidates)
            .unwrap_err();
        let TickValidationError::NonZeroNetSum { changes, .. } = &err;
        assert!(changes.is_empty());
        assert!(err.to_string().contains("3 ticks"));
    }

    #[test]
    fn consistent_candidates_pass() {
        let validator = ConsistencyValidator::default();
        assert!(validator
            .validate_pool_ticks(&balanced(), &[tick(-10, 9, 9), tick(10, 9, -9)])
            .is_ok());
    }
}
