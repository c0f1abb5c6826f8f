//! Error taxonomy for the tick tracker
//!
//! Node error text is classified exactly once, inside the web3 client; every
//! other layer dispatches on the variant.

use dex::DecodingError;
use thiserror::Error;
use tick_state::EntityError;

/// Failure at the chain RPC boundary
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// Node no longer retains state for the requested block
    #[error("State pruned at block {block}: {message}")]
    Pruned { block: u64, message: String },

    #[error("RPC transport failure: {0}")]
    Transport(String),

    #[error("RPC request cancelled after {timeout_ms}ms")]
    Cancelled { timeout_ms: u64 },

    #[error("Malformed RPC response: {0}")]
    Decode(String),
}

impl RpcError {
    pub fn is_pruned(&self) -> bool {
        matches!(self, RpcError::Pruned { .. })
    }
}

impl From<DecodingError> for RpcError {
    fn from(err: DecodingError) -> Self {
        RpcError::Decode(err.to_string())
    }
}

/// Failure querying the tick index (subgraph)
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("Index HTTP failure: {0}")]
    Http(String),

    /// The index answered with errors; `partial` holds any data it still returned
    #[error("Index query failed: {message}")]
    Query {
        message: String,
        partial: Option<Vec<crate::subgraph::IndexedTick>>,
    },

    #[error("Malformed index response: {0}")]
    Malformed(String),
}

/// Call-level failure of `reconcile`, `initialize` or `refresh_ticks`.
///
/// The caller keeps its previous snapshot whenever one of these is returned.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Ticks still fail the zero-sum check after a full refetch
    #[error("Tick map inconsistent after full refetch at block {block} ({tick_count} ticks)")]
    InconsistentTicks { block: u64, tick_count: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
