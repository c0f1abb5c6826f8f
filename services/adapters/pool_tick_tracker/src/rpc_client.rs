//! Chain RPC client
//!
//! `ChainClient` is the seam between the tracker and a node. The web3
//! implementation batches every read through Multicall3 so that all values in
//! one request come from the same block, and turns node errors into the closed
//! [`RpcError`] taxonomy.

use async_trait::async_trait;
use dex::abi::{erc20, multicall, tick_lens, uniswap_v3};
use dex::{get_liquidity_signatures, MulticallCall, MulticallResult, PopulatedTick};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::time::Duration;
use tick_state::{BlockHeader, Tick};
use tracing::{debug, warn};
use web3::transports::Http;
use web3::types::{BlockId, BlockNumber, Bytes, CallRequest, FilterBuilder, Log, H160, U256, U64};
use web3::Web3;

use crate::config::TrackerConfig;
use crate::error::RpcError;
use crate::metrics::TrackerMetrics;

/// Substring nodes use when historical state has been pruned
const MISSING_TRIE_NODE: &str = "missing trie node";

/// Top-level pool fields read in one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRpcState {
    pub liquidity: u128,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub tick_spacing: i32,
    /// Token balances of the pool, base-10; "0" when unknown
    pub reserves: [String; 2],
}

/// Read surface the tracker needs from a node. `block == 0` means latest.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn block_number(&self) -> Result<u64, RpcError>;

    /// `ticks(i)` for every index in one batched read, positionally
    async fn ticks(&self, pool: H160, indices: &[i32], block: u64) -> Result<Vec<Tick>, RpcError>;

    /// Liquidity, price, tick spacing and, when a token pair is given, reserves
    async fn pool_state(
        &self,
        pool: H160,
        tokens: Option<(H160, H160)>,
        block: u64,
    ) -> Result<PoolRpcState, RpcError>;

    async fn tick_spacing(&self, pool: H160, block: u64) -> Result<i32, RpcError>;

    /// TickLens `getPopulatedTicksInWord` for each bitmap word, concatenated
    async fn populated_ticks(
        &self,
        tick_lens: H160,
        pool: H160,
        words: &[i16],
    ) -> Result<Vec<PopulatedTick>, RpcError>;
}

/// Run `fetch` at `block`; if a historical read hits pruned state, run it once more at latest.
pub async fn with_latest_fallback<T, F, Fut>(
    pool: H160,
    block: u64,
    metrics: &TrackerMetrics,
    mut fetch: F,
) -> Result<T, RpcError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<T, RpcError>>,
{
    match fetch(block).await {
        Err(e) if block > 0 && e.is_pruned() => {
            warn!(
                pool = %format!("0x{}", hex::encode(pool.as_bytes())),
                block,
                error = %e,
                "Historical state pruned, retrying at latest block"
            );
            metrics.record_pruned_fallback();
            fetch(0).await
        }
        other => other,
    }
}

fn block_id(block: u64) -> Option<BlockId> {
    if block == 0 {
        None
    } else {
        Some(BlockId::Number(BlockNumber::Number(U64::from(block))))
    }
}

/// Classify a JSON-RPC error message returned by the node
pub fn classify_rpc_message(message: String, block: u64) -> RpcError {
    if message.to_lowercase().contains(MISSING_TRIE_NODE) {
        RpcError::Pruned { block, message }
    } else {
        RpcError::Transport(message)
    }
}

/// Map a web3 failure onto the tracker's error classes
pub fn classify_web3_error(err: web3::Error, block: u64) -> RpcError {
    match err {
        web3::Error::Rpc(rpc) => classify_rpc_message(rpc.message, block),
        web3::Error::Decoder(msg) | web3::Error::InvalidResponse(msg) => RpcError::Decode(msg),
        other => RpcError::Transport(other.to_string()),
    }
}

/// Bound a node request by `deadline`. The HTTP client carries only a connect
/// timeout, so an expired request always surfaces as [`RpcError::Cancelled`].
pub async fn with_deadline<T, Fut>(deadline: Duration, block: u64, fut: Fut) -> Result<T, RpcError>
where
    Fut: Future<Output = Result<T, web3::Error>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(|e| classify_web3_error(e, block)),
        Err(_) => Err(RpcError::Cancelled {
            timeout_ms: deadline.as_millis() as u64,
        }),
    }
}

/// Web3-backed [`ChainClient`]
pub struct Web3ChainClient {
    web3: Web3<Http>,
    multicall: H160,
    timeout: Duration,
}

impl Web3ChainClient {
    pub fn new(config: &TrackerConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(10)
            .connect_timeout(config.rpc_timeout())
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        let transport = Http::with_client(
            client,
            config
                .rpc_url
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid RPC URL: {}", e))?,
        );

        Ok(Self {
            web3: Web3::new(transport),
            multicall: config.multicall()?,
            timeout: config.rpc_timeout(),
        })
    }

    async fn bounded<T, Fut>(&self, block: u64, fut: Fut) -> Result<T, RpcError>
    where
        Fut: Future<Output = Result<T, web3::Error>>,
    {
        with_deadline(self.timeout, block, fut).await
    }

    async fn eth_call(&self, to: H160, data: Vec<u8>, block: u64) -> Result<Vec<u8>, RpcError> {
        let request = CallRequest {
            to: Some(to),
            data: Some(Bytes(data)),
            ..Default::default()
        };
        let result = self
            .bounded(block, self.web3.eth().call(request, block_id(block)))
            .await?;
        Ok(result.0)
    }

    async fn aggregate(
        &self,
        calls: &[MulticallCall],
        block: u64,
    ) -> Result<Vec<MulticallResult>, RpcError> {
        let data = multicall::encode_aggregate3(calls)?;
        let raw = self.eth_call(self.multicall, data, block).await?;
        let results = multicall::decode_aggregate3(&raw)?;
        if results.len() != calls.len() {
            return Err(RpcError::Decode(format!(
                "multicall returned {} results for {} calls",
                results.len(),
                calls.len()
            )));
        }
        Ok(results)
    }

    /// Mint/Burn logs emitted by `pools` in `[from, to]`
    pub async fn liquidity_logs(
        &self,
        pools: &[H160],
        from: u64,
        to: u64,
    ) -> Result<Vec<Log>, RpcError> {
        let filter = FilterBuilder::default()
            .address(pools.to_vec())
            .topics(Some(get_liquidity_signatures().to_vec()), None, None, None)
            .from_block(BlockNumber::Number(U64::from(from)))
            .to_block(BlockNumber::Number(U64::from(to)))
            .build();
        self.bounded(to, self.web3.eth().logs(filter)).await
    }

    /// Headers for the given block numbers; blocks the node does not return are omitted
    pub async fn block_headers(
        &self,
        numbers: &BTreeSet<u64>,
    ) -> Result<HashMap<u64, BlockHeader>, RpcError> {
        let mut headers = HashMap::with_capacity(numbers.len());
        for &number in numbers {
            let id = BlockId::Number(BlockNumber::Number(U64::from(number)));
            if let Some(block) = self.bounded(number, self.web3.eth().block(id)).await? {
                headers.insert(
                    number,
                    BlockHeader {
                        number,
                        hash: block.hash.unwrap_or_default(),
                        timestamp: block.timestamp.low_u64(),
                    },
                );
            }
        }
        Ok(headers)
    }
}

fn strict_data(result: &MulticallResult, what: &str) -> Result<Vec<u8>, RpcError> {
    if !result.success {
        return Err(RpcError::Decode(format!("{what} call reverted")));
    }
    Ok(result.return_data.clone())
}

#[async_trait]
impl ChainClient for Web3ChainClient {
    async fn block_number(&self) -> Result<u64, RpcError> {
        let number = self.bounded(0, self.web3.eth().block_number()).await?;
        Ok(number.as_u64())
    }

    async fn ticks(&self, pool: H160, indices: &[i32], block: u64) -> Result<Vec<Tick>, RpcError> {
        let calls = indices
            .iter()
            .map(|&i| Ok(MulticallCall::strict(pool, uniswap_v3::encode_ticks_call(i)?)))
            .collect::<Result<Vec<_>, RpcError>>()?;

        let results = self.aggregate(&calls, block).await?;
        indices
            .iter()
            .zip(results.iter())
            .map(|(&index, result)| {
                let info = uniswap_v3::decode_ticks_output(&strict_data(result, "ticks")?)?;
                Ok(Tick {
                    index,
                    liquidity_gross: info.liquidity_gross,
                    liquidity_net: info.liquidity_net,
                })
            })
            .collect()
    }

    async fn pool_state(
        &self,
        pool: H160,
        tokens: Option<(H160, H160)>,
        block: u64,
    ) -> Result<PoolRpcState, RpcError> {
        let mut calls = vec![
            MulticallCall::strict(
                pool,
                uniswap_v3::encode_no_args(&uniswap_v3::liquidity_function())?,
            ),
            MulticallCall::strict(pool, uniswap_v3::encode_no_args(&uniswap_v3::slot0_function())?),
            MulticallCall::strict(
                pool,
                uniswap_v3::encode_no_args(&uniswap_v3::tick_spacing_function())?,
            ),
        ];
        if let Some((token0, token1)) = tokens {
            let balance_call = erc20::encode_balance_of(pool)?;
            calls.push(MulticallCall::optional(token0, balance_call.clone()));
            calls.push(MulticallCall::optional(token1, balance_call));
        }

        let results = self.aggregate(&calls, block).await?;
        let liquidity = uniswap_v3::decode_liquidity_output(&strict_data(&results[0], "liquidity")?)?;
        let slot0 = uniswap_v3::decode_slot0_output(&strict_data(&results[1], "slot0")?)?;
        let tick_spacing =
            uniswap_v3::decode_tick_spacing_output(&strict_data(&results[2], "tickSpacing")?)?;

        // Reserves are display-only; a token that refuses balanceOf reads as zero
        let reserve = |i: usize| -> String {
            results
                .get(i)
                .filter(|r| r.success)
                .and_then(|r| erc20::decode_balance_of(&r.return_data).ok())
                .unwrap_or_default()
                .to_string()
        };

        debug!(block, liquidity, tick = slot0.tick, "Fetched pool state");

        Ok(PoolRpcState {
            liquidity,
            sqrt_price_x96: slot0.sqrt_price_x96,
            tick: slot0.tick,
            tick_spacing,
            reserves: [reserve(3), reserve(4)],
        })
    }

    async fn tick_spacing(&self, pool: H160, block: u64) -> Result<i32, RpcError> {
        let data = uniswap_v3::encode_no_args(&uniswap_v3::tick_spacing_function())?;
        let raw = self.eth_call(pool, data, block).await?;
        Ok(uniswap_v3::decode_tick_spacing_output(&raw)?)
    }

    async fn populated_ticks(
        &self,
        tick_lens: H160,
        pool: H160,
        words: &[i16],
    ) -> Result<Vec<PopulatedTick>, RpcError> {
        let calls = words
            .iter()
            .map(|&w| {
                Ok(MulticallCall::strict(
                    tick_lens,
                    tick_lens::encode_populated_ticks_call(pool, w)?,
                ))
            })
            .collect::<Result<Vec<_>, RpcError>>()?;

        let mut ticks = Vec::new();
        for result in self.aggregate(&calls, 0).await? {
            ticks.extend(tick_lens::decode_populated_ticks(&strict_data(
                &result,
                "getPopulatedTicksInWord",
            )?)?);
        }
        Ok(ticks)
    }
}
