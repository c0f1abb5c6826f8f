//! Pool Tick Tracker
//!
//! Keeps an off-chain mirror of each concentrated-liquidity pool's tick map
//! current by replaying Mint/Burn logs, and goes back to the chain only when
//! the replayed map fails its zero-sum check. Survives reorgs (retracted logs)
//! and pruned nodes (historical reads fall back to latest once).
//!
//! Features:
//! - Replay → narrow refetch → full refetch escalation ladder
//! - Chunked Multicall3 tick reads with a single pruned-state fallback
//! - Cold start from a subgraph or the TickLens contract
//! - Snapshot store that only ever holds successful results
//!
//! Components talk to the network only through [`ChainClient`] and
//! [`TickIndexClient`], so every path can be driven by in-memory doubles.

pub mod assembler;
pub mod config;
pub mod error;
pub mod initializer;
pub mod metrics;
pub mod poller;
pub mod reorg;
pub mod rpc_client;
pub mod store;
pub mod subgraph;
pub mod tick_fetcher;
pub mod tick_lens;
pub mod tracker;

pub use assembler::StateAssembler;
pub use config::{TrackedPool, TrackerConfig};
pub use error::{IndexError, Result, RpcError, TrackerError};
pub use initializer::{FullStateInitializer, TickSource};
pub use metrics::{MetricsSnapshot, TrackerMetrics};
pub use poller::{LogFeed, LogPoller, PendingLogs};
pub use reorg::{LadderOutcome, LadderStep, ReorgHandler};
pub use rpc_client::{
    with_deadline, with_latest_fallback, ChainClient, PoolRpcState, Web3ChainClient,
};
pub use store::PoolRecordStore;
pub use subgraph::{fetch_all_ticks, IndexedTick, SubgraphClient, TickIndexClient};
pub use tick_fetcher::RpcTickFetcher;
pub use tick_lens::TickLensEnumerator;
pub use tracker::PoolTickTracker;
