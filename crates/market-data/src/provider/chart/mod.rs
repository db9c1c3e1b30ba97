//! Chart-style scraper adapter.
//!
//! Issues one `GET {base}/v8/finance/chart/{symbol}` per symbol with a
//! browser user agent and reads the regular-market price, volume and time.
//! Requests are paced sequentially.

mod models;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::models::{ChartQuote, RawQuote};
use crate::pacing::Pacer;
use crate::provider::http::{build_client, send_for_text};
use crate::provider::{QuoteSource, RateLimit, SourceOptions};

use models::{ChartPayload, ChartSnapshot};

const PROVIDER_ID: &str = "YAHOO_CHART";
const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Per-symbol chart scraper.
pub struct ChartScraperProvider {
    client: Client,
    base_url: String,
    pacer: Pacer,
}

impl ChartScraperProvider {
    pub fn new(options: SourceOptions) -> Result<Self, MarketDataError> {
        Ok(Self {
            client: build_client(PROVIDER_ID, &options)?,
            base_url: options.resolve_base_url(DEFAULT_BASE_URL),
            pacer: Pacer::new(PROVIDER_ID, options.min_delay),
        })
    }
}

fn snapshot_to_quote(symbol: &str, snapshot: ChartSnapshot) -> ChartQuote {
    ChartQuote {
        symbol: snapshot.symbol.unwrap_or_else(|| symbol.to_string()),
        short_name: snapshot.short_name,
        price: snapshot.regular_market_price,
        volume: snapshot.regular_market_volume,
        timestamp: snapshot.regular_market_time,
        change_percent: snapshot.regular_market_change_percent,
    }
}

/// Parse a chart body for `symbol`.
pub fn parse_chart(symbol: &str, body: &str) -> Result<ChartQuote, MarketDataError> {
    let payload: ChartPayload = serde_json::from_str(body)
        .map_err(|e| MarketDataError::malformed(PROVIDER_ID, format!("chart response: {}", e)))?;

    if let Some(chart) = payload.chart {
        if let Some(error) = &chart.error {
            debug!(
                "Chart error for {}: {:?} {:?}",
                symbol, error.code, error.description
            );
        }

        let meta = chart
            .result
            .and_then(|results| results.into_iter().next())
            .map(|r| r.meta)
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        return Ok(snapshot_to_quote(symbol, meta));
    }

    if payload.top.is_empty() {
        return Err(MarketDataError::malformed(
            PROVIDER_ID,
            "chart response has no quote fields",
        ));
    }

    Ok(snapshot_to_quote(symbol, payload.top))
}

#[async_trait]
impl QuoteSource for ChartScraperProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            min_delay: self.pacer.min_delay(),
            max_batch_size: 1,
        }
    }

    async fn fetch(&self, symbol: &str) -> Result<RawQuote, MarketDataError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(MarketDataError::InvalidRequest("empty symbol".to_string()));
        }

        self.pacer.wait().await;

        let url = format!("{}/v8/finance/chart/{}", self.base_url, encode(symbol));
        let body = send_for_text(PROVIDER_ID, symbol, self.client.get(&url)).await?;

        parse_chart(symbol, &body).map(RawQuote::Chart)
    }
}
