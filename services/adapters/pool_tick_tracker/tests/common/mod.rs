//! Scripted chain and index doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use dex::abi::conversions::tick_to_u256;
use dex::{PopulatedTick, UNISWAP_V3_BURN, UNISWAP_V3_MINT};
use ethabi::Token;
use pool_tick_tracker::{
    ChainClient, IndexError, IndexedTick, PoolRpcState, RpcError, TickIndexClient, TrackerConfig,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tick_state::{EntityAdapter, PoolExtra, PoolRecord, PoolToken, Tick, TickSet};
use web3::types::{Bytes, Log, H160, H256, U256, U64};

pub const POOL: &str = "0x4545454545454545454545454545454545454545";
pub const TOKEN0: &str = "0x2791bca1f2de4661ed88a30c99a7a9449aa84174";
pub const TOKEN1: &str = "0x7ceb23fd6bc0add59e62ac25578270cff1b9f619";
pub const TICK_LENS: &str = "0xbfd8137f7d1516d3ea5ca83523914859ec47f573";

pub fn pool_address() -> H160 {
    H160::repeat_byte(0x45)
}

pub fn tick(index: i32, gross: u128, net: i128) -> Tick {
    Tick {
        index,
        liquidity_gross: gross,
        liquidity_net: net,
    }
}

pub fn test_config() -> TrackerConfig {
    TrackerConfig {
        subgraph_url: "https://index.test".to_string(),
        tick_lens_address: TICK_LENS.to_string(),
        ..TrackerConfig::default()
    }
}

/// Record for [`POOL`] with two tokens and the given ticks
pub fn record_with_ticks(ticks: &[Tick], block_number: u64, timestamp: i64) -> PoolRecord {
    let set: TickSet = ticks.iter().copied().collect();
    let extra = PoolExtra::new(10, U256::from(79_228_162_514_264_337_593_543_950_336u128), 10, 150, &set);
    let base = PoolRecord {
        address: POOL.to_string(),
        exchange: "uniswap-v3".to_string(),
        tokens: vec![
            PoolToken {
                address: TOKEN0.to_string(),
                decimals: 6,
            },
            PoolToken {
                address: TOKEN1.to_string(),
                decimals: 18,
            },
        ],
        ..PoolRecord::default()
    };
    EntityAdapter::with_snapshot(
        &base,
        &extra,
        vec!["0".to_string(), "0".to_string()],
        block_number,
        timestamp,
    )
    .unwrap()
}

pub fn persisted_ticks(record: &PoolRecord) -> Vec<Tick> {
    EntityAdapter::extra(record).unwrap().ticks
}

fn topic_for_tick(tick: i32) -> H256 {
    let mut buf = [0u8; 32];
    tick_to_u256(tick).to_big_endian(&mut buf);
    H256(buf)
}

fn pool_log(block: u64, index: u64, topics: Vec<H256>, data: Vec<u8>) -> Log {
    Log {
        address: pool_address(),
        topics,
        data: Bytes(data),
        block_hash: Some(H256::repeat_byte(block as u8)),
        block_number: Some(U64::from(block)),
        transaction_hash: Some(H256::repeat_byte(0xee)),
        transaction_index: Some(U64::zero()),
        log_index: Some(U256::from(index)),
        transaction_log_index: None,
        log_type: None,
        removed: Some(false),
    }
}

pub fn mint_log(block: u64, index: u64, lower: i32, upper: i32, amount: u128) -> Log {
    let data = ethabi::encode(&[
        Token::Address(H160::repeat_byte(0x0a)),
        Token::Uint(U256::from(amount)),
        Token::Uint(U256::from(1000u64)),
        Token::Uint(U256::from(2000u64)),
    ]);
    let topics = vec![
        UNISWAP_V3_MINT,
        H256::from(H160::repeat_byte(0x0b)),
        topic_for_tick(lower),
        topic_for_tick(upper),
    ];
    pool_log(block, index, topics, data)
}

pub fn burn_log(block: u64, index: u64, lower: i32, upper: i32, amount: u128) -> Log {
    let data = ethabi::encode(&[
        Token::Uint(U256::from(amount)),
        Token::Uint(U256::from(1000u64)),
        Token::Uint(U256::from(2000u64)),
    ]);
    let topics = vec![
        UNISWAP_V3_BURN,
        H256::from(H160::repeat_byte(0x0b)),
        topic_for_tick(lower),
        topic_for_tick(upper),
    ];
    pool_log(block, index, topics, data)
}

pub fn reverted(mut log: Log) -> Log {
    log.removed = Some(true);
    log
}

/// Synthetic log that only wakes the pool
pub fn wake_log(block: u64) -> Log {
    Log {
        address: H160::zero(),
        topics: vec![],
        data: Bytes(vec![]),
        block_hash: None,
        block_number: Some(U64::from(block)),
        transaction_hash: None,
        transaction_index: None,
        log_index: Some(U256::zero()),
        transaction_log_index: None,
        log_type: None,
        removed: Some(false),
    }
}

/// In-memory chain: a tick table at "latest" plus failure switches
#[derive(Default)]
pub struct MockChain {
    pub head: u64,
    pub tick_spacing: i32,
    pub ticks: Mutex<HashMap<i32, Tick>>,

    /// Historical (block > 0) reads fail as pruned
    pub prune_historical: AtomicBool,
    /// Every read fails as pruned, latest included
    pub prune_all: AtomicBool,
    /// Tick batch number (1-based) that fails with a transport error
    pub fail_tick_batch: Mutex<Option<usize>>,
    /// `pool_state` never resolves
    pub hang_pool_state: AtomicBool,

    /// `(block, batch size)` per tick batch, failures included
    pub tick_batches: Mutex<Vec<(u64, usize)>>,
    pub state_blocks: Mutex<Vec<u64>>,
    pub word_batches: Mutex<Vec<usize>>,
    pub block_number_calls: AtomicUsize,
}

impl MockChain {
    pub fn with_ticks(ticks: &[Tick]) -> Self {
        Self {
            head: 1_000,
            tick_spacing: 10,
            ticks: Mutex::new(ticks.iter().map(|t| (t.index, *t)).collect()),
            ..Self::default()
        }
    }

    pub fn tick_batches(&self) -> Vec<(u64, usize)> {
        self.tick_batches.lock().unwrap().clone()
    }

    pub fn state_blocks(&self) -> Vec<u64> {
        self.state_blocks.lock().unwrap().clone()
    }

    fn check_pruned(&self, block: u64) -> Result<(), RpcError> {
        let pruned = self.prune_all.load(Ordering::SeqCst)
            || (block > 0 && self.prune_historical.load(Ordering::SeqCst));
        if pruned {
            return Err(RpcError::Pruned {
                block,
                message: "missing trie node abcdef (path )".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn block_number(&self) -> Result<u64, RpcError> {
        self.block_number_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.head)
    }

    async fn ticks(&self, _pool: H160, indices: &[i32], block: u64) -> Result<Vec<Tick>, RpcError> {
        let batch_number = {
            let mut batches = self.tick_batches.lock().unwrap();
            batches.push((block, indices.len()));
            batches.len()
        };
        if *self.fail_tick_batch.lock().unwrap() == Some(batch_number) {
            return Err(RpcError::Transport("connection reset by peer".to_string()));
        }
        self.check_pruned(block)?;

        let chain = self.ticks.lock().unwrap();
        Ok(indices
            .iter()
            .map(|i| chain.get(i).copied().unwrap_or(Tick::empty(*i)))
            .collect())
    }

    async fn pool_state(
        &self,
        _pool: H160,
        tokens: Option<(H160, H160)>,
        block: u64,
    ) -> Result<PoolRpcState, RpcError> {
        if self.hang_pool_state.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.state_blocks.lock().unwrap().push(block);
        self.check_pruned(block)?;

        let reserves = match tokens {
            Some(_) => ["1000000".to_string(), "2000000".to_string()],
            None => ["0".to_string(), "0".to_string()],
        };
        Ok(PoolRpcState {
            liquidity: 42,
            sqrt_price_x96: U256::from(79_228_162_514_264_337_593_543_950_336u128),
            tick: 0,
            tick_spacing: self.tick_spacing,
            reserves,
        })
    }

    async fn tick_spacing(&self, _pool: H160, _block: u64) -> Result<i32, RpcError> {
        Ok(self.tick_spacing)
    }

    async fn populated_ticks(
        &self,
        _tick_lens: H160,
        _pool: H160,
        words: &[i16],
    ) -> Result<Vec<PopulatedTick>, RpcError> {
        self.word_batches.lock().unwrap().push(words.len());
        let spacing = self.tick_spacing;
        let chain = self.ticks.lock().unwrap();
        let mut ticks: Vec<PopulatedTick> = chain
            .values()
            .filter(|t| t.is_initialized())
            .filter(|t| words.contains(&((t.index.div_euclid(spacing) >> 8) as i16)))
            .map(|t| PopulatedTick {
                tick: t.index,
                liquidity_net: t.liquidity_net,
                liquidity_gross: t.liquidity_gross,
            })
            .collect();
        ticks.sort_by_key(|t| t.tick);
        Ok(ticks)
    }
}

pub fn indexed(index: i32, gross: u128, net: i128) -> IndexedTick {
    IndexedTick {
        tick_idx: index.to_string(),
        liquidity_gross: gross.to_string(),
        liquidity_net: net.to_string(),
    }
}

/// Index returning scripted pages in order, recording each cursor it was asked for
#[derive(Default)]
pub struct MockIndex {
    pub pages: Mutex<VecDeque<Result<Vec<IndexedTick>, IndexError>>>,
    pub cursors: Mutex<Vec<Option<String>>>,
}

impl MockIndex {
    pub fn scripted(pages: Vec<Result<Vec<IndexedTick>, IndexError>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            cursors: Mutex::new(Vec::new()),
        }
    }

    pub fn cursors(&self) -> Vec<Option<String>> {
        self.cursors.lock().unwrap().clone()
    }
}

#[async_trait]
impl TickIndexClient for MockIndex {
    async fn ticks_page(
        &self,
        _pool: &str,
        after: Option<&str>,
        _first: usize,
        _allow_errors: bool,
    ) -> Result<Vec<IndexedTick>, IndexError> {
        self.cursors
            .lock()
            .unwrap()
            .push(after.map(str::to_string));
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
