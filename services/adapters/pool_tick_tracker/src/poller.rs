//! Log polling for the service loop
//!
//! Each round reads Mint/Burn logs from the block after the last handled one
//! up to the head, then reconciles every pool with pending logs concurrently.
//! Logs enter the pending set only after every read of the round succeeded,
//! so a failed round is simply repeated and no log is replayed twice.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tick_state::{BlockHeader, PoolRecord};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};
use web3::types::{Log, H160, H256};

use crate::error::{Result, RpcError};
use crate::rpc_client::{ChainClient, Web3ChainClient};
use crate::store::PoolRecordStore;
use crate::tracker::PoolTickTracker;

/// Node reads the poll loop needs beyond [`ChainClient`]
#[async_trait]
pub trait LogFeed: Send + Sync {
    async fn head(&self) -> std::result::Result<u64, RpcError>;

    async fn liquidity_logs(
        &self,
        pools: &[H160],
        from: u64,
        to: u64,
    ) -> std::result::Result<Vec<Log>, RpcError>;

    async fn block_headers(
        &self,
        numbers: &BTreeSet<u64>,
    ) -> std::result::Result<HashMap<u64, BlockHeader>, RpcError>;
}

#[async_trait]
impl LogFeed for Web3ChainClient {
    async fn head(&self) -> std::result::Result<u64, RpcError> {
        ChainClient::block_number(self).await
    }

    async fn liquidity_logs(
        &self,
        pools: &[H160],
        from: u64,
        to: u64,
    ) -> std::result::Result<Vec<Log>, RpcError> {
        Web3ChainClient::liquidity_logs(self, pools, from, to).await
    }

    async fn block_headers(
        &self,
        numbers: &BTreeSet<u64>,
    ) -> std::result::Result<HashMap<u64, BlockHeader>, RpcError> {
        Web3ChainClient::block_headers(self, numbers).await
    }
}

/// `(blockHash, blockNumber, logIndex, removed)`; a retraction is distinct from the log it retracts
type LogIdentity = (Option<H256>, u64, u64, bool);

fn identity(log: &Log) -> LogIdentity {
    let (block, index) = tick_state::log_position(log);
    (log.block_hash, block, index, tick_state::is_reverted(log))
}

fn pool_key(log: &Log) -> String {
    format!("0x{}", hex::encode(log.address.as_bytes()))
}

/// Logs waiting to be reconciled, grouped by lower-cased pool address
#[derive(Debug, Default)]
pub struct PendingLogs {
    by_pool: HashMap<String, Vec<Log>>,
    seen: HashSet<LogIdentity>,
}

impl PendingLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `logs`, skipping any already pending. Returns how many were added.
    pub fn merge(&mut self, logs: Vec<Log>) -> usize {
        let mut added = 0;
        for log in logs {
            if !self.seen.insert(identity(&log)) {
                debug!(block = ?log.block_number, index = ?log.log_index, "Skipping duplicate pending log");
                continue;
            }
            self.by_pool.entry(pool_key(&log)).or_default().push(log);
            added += 1;
        }
        added
    }

    pub fn get(&self, pool_address: &str) -> Option<&[Log]> {
        self.by_pool
            .get(&pool_address.to_lowercase())
            .map(|logs| logs.as_slice())
    }

    pub fn pools(&self) -> impl Iterator<Item = (&String, &Vec<Log>)> {
        self.by_pool.iter()
    }

    /// Block numbers referenced by pending logs
    pub fn blocks(&self) -> BTreeSet<u64> {
        self.by_pool
            .values()
            .flatten()
            .filter_map(|log| log.block_number.map(|n| n.as_u64()))
            .collect()
    }

    /// Drop a pool's logs once they are reflected in its snapshot
    pub fn settle(&mut self, pool_address: &str) {
        if let Some(logs) = self.by_pool.remove(&pool_address.to_lowercase()) {
            for log in &logs {
                self.seen.remove(&identity(log));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_pool.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pool.is_empty()
    }
}

/// Drives one reconcile round per call
pub struct LogPoller {
    feed: Arc<dyn LogFeed>,
    tracker: Arc<PoolTickTracker>,
    pools: Vec<H160>,
    pending: PendingLogs,
    last_block: u64,
}

impl LogPoller {
    pub fn new(
        feed: Arc<dyn LogFeed>,
        tracker: Arc<PoolTickTracker>,
        pools: Vec<H160>,
        last_block: u64,
    ) -> Self {
        Self {
            feed,
            tracker,
            pools,
            pending: PendingLogs::new(),
            last_block,
        }
    }

    /// Highest block whose logs have been taken in
    pub fn last_block(&self) -> u64 {
        self.last_block
    }

    pub fn pending(&self) -> &PendingLogs {
        &self.pending
    }

    /// One polling round; returns the new head once its logs were taken in
    pub async fn poll_once(&mut self, store: &PoolRecordStore) -> Result<Option<u64>> {
        let head = self.feed.head().await?;
        if head <= self.last_block {
            return Ok(None);
        }

        let fetched = self
            .feed
            .liquidity_logs(&self.pools, self.last_block + 1, head)
            .await?;

        let mut blocks = self.pending.blocks();
        blocks.extend(
            fetched
                .iter()
                .filter_map(|log| log.block_number.map(|n| n.as_u64())),
        );
        let headers: Arc<HashMap<u64, BlockHeader>> = if blocks.is_empty() {
            Arc::new(HashMap::new())
        } else {
            Arc::new(self.feed.block_headers(&blocks).await?)
        };

        // Every read succeeded; only now do the fetched logs count as taken in
        let added = self.pending.merge(fetched);
        self.last_block = head;
        debug!(head, added, pending = self.pending.len(), "Polled liquidity logs");

        if self.pending.is_empty() {
            return Ok(Some(head));
        }

        let mut tasks = JoinSet::new();
        let mut orphaned: Vec<String> = Vec::new();
        for (address, logs) in self.pending.pools() {
            let Some(record) = store.get(address) else {
                warn!("Dropping {} logs for uninitialized pool {}", logs.len(), address);
                orphaned.push(address.clone());
                continue;
            };
            let tracker = self.tracker.clone();
            let headers = headers.clone();
            let logs = logs.clone();
            let address = address.clone();
            tasks.spawn(async move {
                let result = tracker.reconcile(&record, &logs, &*headers).await;
                (address, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (address, result): (String, Result<PoolRecord>) = match joined {
                Ok(done) => done,
                Err(e) => {
                    error!("Reconcile task panicked: {}", e);
                    continue;
                }
            };
            match result {
                Ok(updated) => {
                    debug!("Pool {} reconciled to block {}", address, updated.block_number);
                    store.commit(updated);
                    self.pending.settle(&address);
                }
                // Logs stay pending so the next round replays them on top of the old snapshot
                Err(e) => warn!(
                    "Reconcile failed for pool {}, keeping previous snapshot: {}",
                    address, e
                ),
            }
        }
        for address in orphaned {
            self.pending.settle(&address);
        }

        Ok(Some(head))
    }
}
