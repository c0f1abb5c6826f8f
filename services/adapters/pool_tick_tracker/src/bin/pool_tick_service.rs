//! Pool Tick Service
//!
//! Cold-starts every configured pool, then polls the chain for Mint/Burn logs
//! and reconciles each pool's tick map. Only successful results reach the
//! snapshot store.
//!
//! Usage:
//!   pool_tick_service --config config/pool_tick_tracker.toml

use anyhow::{Context, Result};
use clap::Parser;
use pool_tick_tracker::{
    ChainClient, LogFeed, LogPoller, PoolRecordStore, PoolTickTracker, SubgraphClient,
    TickIndexClient, TrackerConfig, Web3ChainClient,
};
use std::sync::Arc;
use tick_state::EntityAdapter;
use tokio::signal;
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "pool_tick_service")]
#[command(about = "Concentrated-liquidity tick state tracker")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/pool_tick_tracker.toml")]
    config: String,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let directive = if args.debug {
        "pool_tick_tracker=debug"
    } else {
        "pool_tick_tracker=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    info!("Starting Pool Tick Service");

    let config = TrackerConfig::from_toml_with_env_overrides(&args.config)?;
    config.validate()?;
    info!(
        "Tracking {} pools via {} (subgraph: {})",
        config.pools.len(),
        config.rpc_url,
        if config.subgraph_url.is_empty() { "none" } else { config.subgraph_url.as_str() }
    );

    let client = Arc::new(Web3ChainClient::new(&config)?);
    let index: Option<Arc<dyn TickIndexClient>> = if config.subgraph_url.is_empty() {
        None
    } else {
        Some(Arc::new(SubgraphClient::new(
            config.subgraph_url.clone(),
            config.rpc_timeout(),
        )?))
    };
    let tracker = Arc::new(PoolTickTracker::new(
        config.clone(),
        client.clone() as Arc<dyn ChainClient>,
        index,
    )?);
    let store = PoolRecordStore::new(config.cache_dir.clone())?;

    cold_start(&tracker, &store, &config).await;
    store.force_snapshot()?;

    let last_block = ChainClient::block_number(client.as_ref())
        .await
        .context("Failed to read starting block number")?;
    let pools = config
        .pools
        .iter()
        .map(|p| tick_state::parse_address(&p.address))
        .collect::<Result<Vec<_>, _>>()?;
    let mut poller = LogPoller::new(
        client.clone() as Arc<dyn LogFeed>,
        tracker.clone(),
        pools,
        last_block,
    );
    let mut interval = tokio::time::interval(config.poll_interval());

    info!("Service running from block {}. Press Ctrl+C to stop.", last_block);

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
            _ = interval.tick() => {
                match poller.poll_once(&store).await {
                    Ok(Some(head)) => {
                        debug!("Handled logs up to block {} ({} still pending)", head, poller.pending().len());
                        if let Err(e) = store.force_snapshot() {
                            warn!("Failed to persist snapshot: {}", e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Poll round failed at block {}: {}", poller.last_block(), e),
                }
            }
        }
    }

    store.force_snapshot()?;
    info!("Snapshot saved. Metrics: {:?}", tracker.metrics());
    Ok(())
}

async fn cold_start(tracker: &Arc<PoolTickTracker>, store: &PoolRecordStore, config: &TrackerConfig) {
    for pool in &config.pools {
        let record = store
            .get(&pool.address)
            .unwrap_or_else(|| pool.to_record());
        let initialized = EntityAdapter::extra(&record)
            .map(|extra| !extra.ticks.is_empty())
            .unwrap_or(false);
        if initialized {
            debug!("Pool {} restored from snapshot at block {}", record.address, record.block_number);
            continue;
        }

        match tracker.initialize(&record).await {
            Ok(updated) => {
                info!("Initialized pool {} at block {}", updated.address, updated.block_number);
                store.commit(updated);
            }
            Err(e) => error!("Failed to initialize pool {}: {}", record.address, e),
        }
    }
}
