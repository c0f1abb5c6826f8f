//! Log batch helpers: ordering, reorg markers, wake logs and block headers

use std::collections::{BTreeMap, HashMap};
use web3::types::{Log, H160, H256};

/// Minimal header data needed to timestamp pool activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: H256,
    /// Unix seconds
    pub timestamp: u64,
}

/// Resolve a block number to its header, if the caller has it
pub trait BlockHeaderLookup: Send + Sync {
    fn header(&self, number: u64) -> Option<&BlockHeader>;
}

impl BlockHeaderLookup for HashMap<u64, BlockHeader> {
    fn header(&self, number: u64) -> Option<&BlockHeader> {
        self.get(&number)
    }
}

impl BlockHeaderLookup for BTreeMap<u64, BlockHeader> {
    fn header(&self, number: u64) -> Option<&BlockHeader> {
        self.get(&number)
    }
}

/// Lookup that knows no headers
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHeaders;

impl BlockHeaderLookup for NoHeaders {
    fn header(&self, _number: u64) -> Option<&BlockHeader> {
        None
    }
}

pub fn block_number(log: &Log) -> u64 {
    log.block_number.map(|n| n.as_u64()).unwrap_or(0)
}

/// `(blockNumber, logIndex)`, the canonical application order
pub fn log_position(log: &Log) -> (u64, u64) {
    let index = log.log_index.map(|i| i.low_u64()).unwrap_or(0);
    (block_number(log), index)
}

/// Synthetic log used only to wake a pool: no topics or the zero address
pub fn is_wake_log(log: &Log) -> bool {
    log.topics.is_empty() || log.address == H160::zero()
}

/// A log the node has retracted because its block was reorganized away
pub fn is_reverted(log: &Log) -> bool {
    log.removed == Some(true)
}

pub fn has_reverted_log(logs: &[Log]) -> bool {
    logs.iter().any(is_reverted)
}

/// Logs sorted ascending by `(blockNumber, logIndex)`; stable for equal keys
pub fn sorted_logs(logs: &[Log]) -> Vec<&Log> {
    let mut sorted: Vec<&Log> = logs.iter().collect();
    sorted.sort_by_key(|log| log_position(log));
    sorted
}

/// Highest block among non-reverted logs, 0 (latest) when none carries one
pub fn resolved_block_number(logs: &[Log]) -> u64 {
    logs.iter()
        .filter(|log| !is_reverted(log))
        .map(block_number)
        .max()
        .unwrap_or(0)
}

/// Latest non-wake, non-reverted log of the batch
pub fn latest_activity_log(logs: &[Log]) -> Option<&Log> {
    logs.iter()
        .filter(|log| !is_wake_log(log) && !is_reverted(log))
        .max_by_key(|log| log_position(log))
}

#[cfg(test)]
mod tests {
    use super::*;
    use web3::types::{Bytes, U256, U64};

    fn log_at(block: u64, index: u64) -> Log {
        Log {
            address: H160::repeat_byte(0x01),
            topics: vec![H256::repeat_byte(0x02)],
            data: Bytes(vec![]),
            block_hash: None,
            block_number: Some(U64::from(block)),
            transaction_hash: None,
            transaction_index: None,
            log_index: Some(U256::from(index)),
            transaction_log_index: None,
            log_type: None,
            removed: Some(false),
        }
    }

    #[test]
    fn sorts_by_block_then_index() {
        let logs = vec![log_at(10, 2), log_at(9, 7), log_at(10, 0)];
        let positions: Vec<(u64, u64)> = sorted_logs(&logs).into_iter().map(log_position).collect();
        assert_eq!(positions, vec![(9, 7), (10, 0), (10, 2)]);
    }

    #[test]
    fn resolved_block_skips_reverted_logs() {
        let mut reverted = log_at(12, 0);
        reverted.removed = Some(true);
        let logs = vec![log_at(10, 0), reverted, log_at(11, 3)];

        assert!(has_reverted_log(&logs));
        assert_eq!(resolved_block_number(&logs), 11);
        assert_eq!(resolved_block_number(&[]), 0);
    }

    #[test]
    fn wake_logs_are_detected() {
        let mut no_topics = log_at(5, 0);
        no_topics.topics.clear();
        let mut zero_address = log_at(5, 1);
        zero_address.address = H160::zero();

        assert!(is_wake_log(&no_topics));
        assert!(is_wake_log(&zero_address));
        assert!(!is_wake_log(&log_at(5, 2)));

        let logs = vec![log_at(4, 0), no_topics, zero_address];
        assert_eq!(latest_activity_log(&logs).map(log_position), Some((4, 0)));
    }

    #[test]
    fn header_lookup_over_maps() {
        let header = BlockHeader {
            number: 7,
            hash: H256::repeat_byte(0x07),
            timestamp: 1_700_000_000,
        };
        let map: HashMap<u64, BlockHeader> = [(7, header)].into_iter().collect();

        assert_eq!(map.header(7), Some(&header));
        assert_eq!(map.header(8), None);
        assert_eq!(NoHeaders.header(7), None);
    }
}
