//! Subgraph tick enumeration
//!
//! Pages through a pool's initialized ticks ordered by index, following the
//! last index of each page as the cursor until a short page ends the walk.

use crate::error::IndexError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tick_state::{parse_decimal_i128, parse_decimal_u128, Tick};
use tracing::{debug, error, warn};

/// One tick row as the index returns it (decimal strings)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedTick {
    pub tick_idx: String,
    pub liquidity_gross: String,
    pub liquidity_net: String,
}

impl IndexedTick {
    pub fn to_tick(&self) -> Option<Tick> {
        Some(Tick {
            index: self.tick_idx.trim().parse().ok()?,
            liquidity_gross: parse_decimal_u128(&self.liquidity_gross).ok()?,
            liquidity_net: parse_decimal_i128(&self.liquidity_net).ok()?,
        })
    }
}

/// Paginated tick query against an index
#[async_trait]
pub trait TickIndexClient: Send + Sync {
    /// Up to `first` ticks of `pool` with index above `after`, ascending.
    ///
    /// With `allow_errors` the index is asked to answer despite indexing
    /// errors; a failed query then carries whatever data came back in
    /// `IndexError::Query`.
    async fn ticks_page(
        &self,
        pool: &str,
        after: Option<&str>,
        first: usize,
        allow_errors: bool,
    ) -> Result<Vec<IndexedTick>, IndexError>;
}

pub fn ticks_query(pool: &str, after: Option<&str>, first: usize, allow_errors: bool) -> String {
    let cursor = after
        .map(|idx| format!(", tickIdx_gt: \"{idx}\""))
        .unwrap_or_default();
    let subgraph_error = if allow_errors { ", subgraphError: allow" } else { "" };
    format!(
        "{{ ticks(where: {{pool: \"{}\", liquidityGross_not: \"0\"{cursor}}}, \
         orderBy: tickIdx, orderDirection: asc, first: {first}{subgraph_error}) \
         {{ tickIdx liquidityGross liquidityNet }} }}",
        pool.to_lowercase()
    )
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<TicksData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct TicksData {
    ticks: Option<Vec<IndexedTick>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

/// Decode a GraphQL response body into one page of ticks
pub fn parse_ticks_response(body: &str) -> Result<Vec<IndexedTick>, IndexError> {
    let response: GraphQlResponse =
        serde_json::from_str(body).map_err(|e| IndexError::Malformed(e.to_string()))?;
    let ticks = response.data.and_then(|d| d.ticks);

    if !response.errors.is_empty() {
        let message = response
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(IndexError::Query {
            message,
            partial: ticks,
        });
    }

    ticks.ok_or_else(|| IndexError::Malformed("response has no ticks field".to_string()))
}

/// GraphQL-over-HTTP index client
pub struct SubgraphClient {
    http: reqwest::Client,
    url: String,
}

impl SubgraphClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create subgraph HTTP client: {}", e))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TickIndexClient for SubgraphClient {
    async fn ticks_page(
        &self,
        pool: &str,
        after: Option<&str>,
        first: usize,
        allow_errors: bool,
    ) -> Result<Vec<IndexedTick>, IndexError> {
        let body = serde_json::json!({ "query": ticks_query(pool, after, first, allow_errors) });
        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexError::Http(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| IndexError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(IndexError::Http(format!("status {status}: {text}")));
        }
        parse_ticks_response(&text)
    }
}

/// Every initialized tick of `pool` known to the index.
///
/// In tolerant mode a failed page that still carried data is used as-is; a
/// failure with no data is fatal either way.
pub async fn fetch_all_ticks(
    client: &dyn TickIndexClient,
    pool: &str,
    page_size: usize,
    tolerant: bool,
) -> Result<Vec<Tick>, IndexError> {
    let page_size = page_size.max(1);
    let mut rows: Vec<IndexedTick> = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = match client
            .ticks_page(pool, cursor.as_deref(), page_size, tolerant)
            .await
        {
            Ok(page) => page,
            Err(IndexError::Query {
                message,
                partial: Some(page),
            }) if tolerant => {
                warn!(pool, error = %message, rows = page.len(), "Accepting partial subgraph page");
                page
            }
            Err(e) => {
                error!(pool, error = %e, allow_subgraph_error = tolerant, "Failed to query subgraph");
                return Err(e);
            }
        };

        let len = page.len();
        let last = page.last().map(|row| row.tick_idx.clone());
        rows.extend(page);

        if len < page_size {
            break;
        }
        cursor = last;
    }

    let ticks: Vec<Tick> = rows
        .iter()
        .filter_map(|row| {
            let tick = row.to_tick();
            if tick.is_none() {
                error!(pool, tick_idx = %row.tick_idx, "Skipping unparseable subgraph tick");
            }
            tick
        })
        .collect();

    debug!(pool, rows = rows.len(), ticks = ticks.len(), "Enumerated ticks from subgraph");
    Ok(ticks)
}
