//! Configuration for the Pool Tick Tracker
//!
//! Supports TOML files with environment variable overrides for endpoints.

use crate::error::TrackerError;
use anyhow::{Context, Result};
use dex::MULTICALL3_ADDRESS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tick_state::{parse_address, PoolRecord, PoolToken};
use web3::types::H160;

/// A pool the service binary keeps in sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedPool {
    pub address: String,
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub tokens: Vec<PoolToken>,
}

impl TrackedPool {
    /// Empty record to cold-start from
    pub fn to_record(&self) -> PoolRecord {
        PoolRecord {
            address: self.address.to_lowercase(),
            exchange: self.exchange.clone(),
            tokens: self.tokens.clone(),
            ..PoolRecord::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Tag attached to log lines and metrics
    pub dex_id: String,

    /// JSON-RPC endpoint
    pub rpc_url: String,

    /// Per-request deadline in milliseconds
    pub rpc_timeout_ms: u64,

    /// Multicall3 deployment used for batched reads
    pub multicall_address: String,

    /// Tick indices per batched read
    pub tick_chunk_size: usize,

    /// Subgraph endpoint; empty routes every pool through TickLens
    pub subgraph_url: String,

    /// Rows per subgraph page
    pub subgraph_page_size: usize,

    /// Accept partial subgraph pages when the query reports errors
    pub allow_subgraph_error: bool,

    /// Enumerate ticks on-chain for every pool
    pub always_use_tick_lens: bool,

    /// TickLens periphery contract
    pub tick_lens_address: String,

    /// Bitmap words per TickLens batch
    pub tick_lens_word_chunk: usize,

    /// Pools deployed before the subgraph's coverage began
    pub pre_genesis_pools: Vec<String>,

    /// Max candidate ticks rendered in a validation error
    pub diagnostic_tick_limit: usize,

    /// Service binary polling cadence
    pub poll_interval_ms: u64,

    /// Snapshot store directory (service binary only)
    pub cache_dir: Option<PathBuf>,

    /// Pools tracked by the service binary
    pub pools: Vec<TrackedPool>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            dex_id: "uniswap-v3".to_string(),
            rpc_url: "https://polygon-rpc.com".to_string(),
            rpc_timeout_ms: 10000,
            multicall_address: MULTICALL3_ADDRESS.to_string(),
            tick_chunk_size: 100,
            subgraph_url: String::new(),
            subgraph_page_size: 1000,
            allow_subgraph_error: false,
            always_use_tick_lens: false,
            tick_lens_address: String::new(),
            tick_lens_word_chunk: 100,
            pre_genesis_pools: Vec::new(),
            diagnostic_tick_limit: 10,
            poll_interval_ms: 2000,
            cache_dir: None,
            pools: Vec::new(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from TOML file
    pub fn from_toml_file(file_path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file: {}", file_path))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", file_path))
    }

    /// Load configuration from TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }

    /// Load configuration with environment variable overrides
    pub fn from_toml_with_env_overrides(file_path: &str) -> Result<Self> {
        let mut config = if std::path::Path::new(file_path).exists() {
            Self::from_toml_file(file_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        use std::env;

        if let Ok(rpc_url) = env::var("POOL_TRACKER_RPC_URL") {
            self.rpc_url = rpc_url;
        }

        if let Ok(subgraph_url) = env::var("POOL_TRACKER_SUBGRAPH_URL") {
            self.subgraph_url = subgraph_url;
        }

        if let Ok(timeout) = env::var("POOL_TRACKER_RPC_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse() {
                self.rpc_timeout_ms = timeout;
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), TrackerError> {
        let invalid = |msg: String| Err(TrackerError::Configuration(msg));

        if self.rpc_url.is_empty() {
            return invalid("RPC URL cannot be empty".to_string());
        }
        if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            return invalid(format!("RPC URL must be http(s): {}", self.rpc_url));
        }
        if self.rpc_timeout_ms == 0 {
            return invalid("RPC timeout must be greater than 0".to_string());
        }
        if self.tick_chunk_size == 0 {
            return invalid("Tick chunk size must be greater than 0".to_string());
        }
        if self.subgraph_page_size == 0 {
            return invalid("Subgraph page size must be greater than 0".to_string());
        }
        if self.tick_lens_word_chunk == 0 {
            return invalid("TickLens word chunk must be greater than 0".to_string());
        }

        self.multicall()?;

        let tick_lens_needed = self.always_use_tick_lens
            || !self.pre_genesis_pools.is_empty()
            || self.subgraph_url.is_empty();
        if tick_lens_needed {
            self.tick_lens()?;
        }

        for pool in &self.pools {
            parse_address(&pool.address).map_err(|e| {
                TrackerError::Configuration(format!("Tracked pool {}: {}", pool.address, e))
            })?;
        }

        Ok(())
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Pool not covered by the subgraph (case-insensitive match)
    pub fn is_pre_genesis(&self, pool_address: &str) -> bool {
        self.pre_genesis_pools
            .iter()
            .any(|p| p.eq_ignore_ascii_case(pool_address))
    }

    pub fn multicall(&self) -> std::result::Result<H160, TrackerError> {
        parse_address(&self.multicall_address)
            .map_err(|e| TrackerError::Configuration(format!("multicall_address: {}", e)))
    }

    pub fn tick_lens(&self) -> std::result::Result<H160, TrackerError> {
        if self.tick_lens_address.is_empty() {
            return Err(TrackerError::Configuration(
                "tick_lens_address is required for on-chain tick enumeration".to_string(),
            ));
        }
        parse_address(&self.tick_lens_address)
            .map_err(|e| TrackerError::Configuration(format!("tick_lens_address: {}", e)))
    }

    /// Save configuration to TOML file
    pub fn save_toml_file(&self, file_path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        std::fs::write(file_path, content)
            .with_context(|| format!("Failed to write config file: {}", file_path))?;

        Ok(())
    }
}
