//! Snapshot store for pool records
//!
//! Holds the last successful record per pool address. Failed calls never
//! reach the store, so whatever it holds is the authoritative snapshot.

use anyhow::{Context, Result};
use dashmap::DashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tick_state::PoolRecord;
use tracing::{debug, info};

const SNAPSHOT_FILE: &str = "pool_records.json";

/// Thread-safe record store keyed by lower-cased pool address
pub struct PoolRecordStore {
    records: Arc<DashMap<String, PoolRecord>>,

    /// Persistent snapshot file, `None` keeps the store in memory only
    snapshot_file: Option<PathBuf>,
}

impl PoolRecordStore {
    pub fn new(cache_dir: Option<PathBuf>) -> Result<Self> {
        let snapshot_file = match cache_dir {
            Some(dir) => {
                fs::create_dir_all(&dir).context("Failed to create cache directory")?;
                Some(dir.join(SNAPSHOT_FILE))
            }
            None => None,
        };

        let store = Self {
            records: Arc::new(DashMap::new()),
            snapshot_file,
        };
        store.load_from_disk()?;
        Ok(store)
    }

    pub fn get(&self, pool_address: &str) -> Option<PoolRecord> {
        self.records
            .get(&pool_address.to_lowercase())
            .map(|entry| entry.clone())
    }

    /// Replace the snapshot for the record's pool
    pub fn commit(&self, record: PoolRecord) {
        self.records.insert(record.address.to_lowercase(), record);
    }

    pub fn contains(&self, pool_address: &str) -> bool {
        self.records.contains_key(&pool_address.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn load_from_disk(&self) -> Result<()> {
        let Some(path) = &self.snapshot_file else {
            return Ok(());
        };
        if !path.exists() {
            info!("No existing snapshot file found at {:?}", path);
            return Ok(());
        }

        let data = fs::read_to_string(path).context("Failed to read snapshot file")?;
        let records: Vec<PoolRecord> =
            serde_json::from_str(&data).context("Failed to parse snapshot file")?;
        for record in records {
            self.commit(record);
        }

        info!("Loaded {} pool records from snapshot", self.records.len());
        Ok(())
    }

    /// Write every record to disk (periodically and on shutdown)
    pub fn force_snapshot(&self) -> Result<()> {
        let Some(path) = &self.snapshot_file else {
            return Ok(());
        };

        let mut records: Vec<PoolRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.address.cmp(&b.address));

        let data = serde_json::to_string_pretty(&records).context("Failed to serialize records")?;
        fs::write(path, data).context("Failed to write snapshot file")?;

        debug!("Saved {} pool records to snapshot", records.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(address: &str, block_number: u64) -> PoolRecord {
        PoolRecord {
            address: address.to_string(),
            exchange: "uniswap-v3".to_string(),
            reserves: vec!["0".to_string(), "0".to_string()],
            block_number,
            ..PoolRecord::default()
        }
    }

    #[test]
    fn test_commit_is_case_insensitive() {
        let store = PoolRecordStore::new(None).unwrap();
        store.commit(record("0xABCDEF0000000000000000000000000000000001", 10));

        assert!(store.contains("0xabcdef0000000000000000000000000000000001"));
        assert_eq!(
            store
                .get("0xAbCdEf0000000000000000000000000000000001")
                .unwrap()
                .block_number,
            10
        );

        store.commit(record("0xabcdef0000000000000000000000000000000001", 11));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = TempDir::new().unwrap();
        {
            let store = PoolRecordStore::new(Some(dir.path().to_path_buf())).unwrap();
            store.commit(record("0x0000000000000000000000000000000000000001", 5));
            store.commit(record("0x0000000000000000000000000000000000000002", 6));
            store.force_snapshot().unwrap();
        }

        let reloaded = PoolRecordStore::new(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded
                .get("0x0000000000000000000000000000000000000002")
                .unwrap()
                .block_number,
            6
        );
    }

    #[test]
    fn test_memory_only_snapshot_is_noop() {
        let store = PoolRecordStore::new(None).unwrap();
        store.commit(record("0x0000000000000000000000000000000000000001", 1));
        assert!(store.force_snapshot().is_ok());
    }
}
