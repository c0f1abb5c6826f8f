//! # Tick State - Concentrated Liquidity Tick Mirror
//!
//! ## Purpose
//!
//! Network-free core of the pool tick tracker: an in-memory tick map per pool,
//! replay of Mint/Burn logs onto it, and the zero-sum consistency checks that
//! decide whether a replayed map can be trusted without going back to the chain.
//!
//! ## Architecture Role
//!
//! ```text
//! PoolRecord ──[EntityAdapter]──> TickSet ──[TickReconciler]──> ReplayOutcome
//!                                    │                               │
//!                                    └──[ConsistencyValidator]<──────┘
//! ```
//!
//! Everything here is synchronous and owns its inputs; callers serialize work
//! per pool address, so no type in this crate carries a lock.

pub mod entity;
pub mod logs;
pub mod reconciler;
pub mod tick;
pub mod validator;

#[cfg(test)]
mod testing;

pub use entity::{
    parse_address, parse_decimal_i128, parse_decimal_u128, EntityAdapter, EntityError,
    PoolExtra, PoolRecord, PoolToken,
};
pub use logs::{
    has_reverted_log, is_reverted, is_wake_log, latest_activity_log, log_position,
    resolved_block_number, sorted_logs, BlockHeader, BlockHeaderLookup, NoHeaders,
};
pub use reconciler::{ReplayOutcome, TickReconciler};
pub use tick::{Tick, TickSet};
pub use validator::{
    terminal_validation_failures, ConsistencyValidator, TickChange, TickValidationError,
};
