//! Yahoo Finance quote adapter.
//!
//! Fetches the regular-market snapshot (open, day high/low, price, volume,
//! trade time) for equities and crypto pairs such as `AAPL` or `BTC-USD`
//! through the quoteSummary `price` module. One request per symbol, paced.

mod models;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, warn};
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::models::{RawQuote, TickerQuote};
use crate::pacing::Pacer;
use crate::provider::http::{build_client, send_for_text};
use crate::provider::{QuoteSource, RateLimit, SourceOptions};

use models::YahooQuoteSummaryResponse;

const PROVIDER_ID: &str = "YAHOO_QUOTE";
const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";

// ============================================================================
// Crumb/Cookie Authentication
// ============================================================================

/// Cached Yahoo authentication data
#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

// ============================================================================
// Yahoo Quote Provider
// ============================================================================

/// Yahoo Finance quote adapter.
pub struct YahooQuoteProvider {
    client: Client,
    base_url: String,
    /// `None` when pointed at a custom base URL; mirrors don't issue crumbs.
    cookie_url: Option<String>,
    pacer: Pacer,
    crumb: RwLock<Option<CrumbData>>,
}

impl YahooQuoteProvider {
    pub fn new(options: SourceOptions) -> Result<Self, MarketDataError> {
        let client = build_client(PROVIDER_ID, &options)?;
        let cookie_url = match options.base_url {
            Some(_) => None,
            None => Some(COOKIE_URL.to_string()),
        };

        Ok(Self {
            client,
            base_url: options.resolve_base_url(DEFAULT_BASE_URL),
            cookie_url,
            pacer: Pacer::new(PROVIDER_ID, options.min_delay),
            crumb: RwLock::new(None),
        })
    }

    fn read_crumb(&self) -> RwLockReadGuard<'_, Option<CrumbData>> {
        self.crumb.read().unwrap_or_else(|poisoned| {
            warn!("Yahoo crumb lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_crumb(&self) -> RwLockWriteGuard<'_, Option<CrumbData>> {
        self.crumb.write().unwrap_or_else(|poisoned| {
            warn!("Yahoo crumb lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Return the cached crumb, fetching one if needed.
    ///
    /// Failing to obtain a crumb is not fatal: the quote request is still
    /// sent and its own status decides the outcome.
    async fn ensure_crumb(&self) -> Option<CrumbData> {
        let cookie_url = self.cookie_url.as_deref()?;

        if let Some(crumb) = self.read_crumb().as_ref() {
            return Some(crumb.clone());
        }

        match self.fetch_crumb(cookie_url).await {
            Ok(crumb) => {
                *self.write_crumb() = Some(crumb.clone());
                Some(crumb)
            }
            Err(e) => {
                warn!("Yahoo crumb unavailable, continuing without it: {}", e);
                None
            }
        }
    }

    async fn fetch_crumb(&self, cookie_url: &str) -> Result<CrumbData, MarketDataError> {
        // Step 1: session cookie
        let response = self
            .client
            .get(cookie_url)
            .send()
            .await
            .map_err(|e| MarketDataError::from_reqwest(PROVIDER_ID, e))?;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split_once(';').map(|(v, _)| v.to_string()))
            .ok_or_else(|| MarketDataError::malformed(PROVIDER_ID, "missing session cookie"))?;

        // Step 2: crumb bound to that cookie
        let request = self
            .client
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .header(header::COOKIE, &cookie);
        let crumb = send_for_text(PROVIDER_ID, "crumb", request).await?;

        Ok(CrumbData { cookie, crumb })
    }

    fn clear_crumb(&self) {
        *self.write_crumb() = None;
    }
}

/// Parse a quoteSummary body into a ticker quote for `symbol`.
///
/// Missing price fields are kept as `None`; deciding whether the quote is
/// usable is the normalizer's job.
pub fn parse_quote_summary(symbol: &str, body: &str) -> Result<TickerQuote, MarketDataError> {
    let response: YahooQuoteSummaryResponse = serde_json::from_str(body).map_err(|e| {
        MarketDataError::malformed(PROVIDER_ID, format!("quoteSummary response: {}", e))
    })?;

    if let Some(error) = &response.quote_summary.error {
        debug!(
            "Yahoo quoteSummary error for {}: {:?} {:?}",
            symbol, error.code, error.description
        );
    }

    let price = response
        .quote_summary
        .result
        .as_ref()
        .and_then(|results| results.first())
        .and_then(|r| r.price.as_ref())
        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

    Ok(TickerQuote {
        symbol: price.symbol.clone().unwrap_or_else(|| symbol.to_string()),
        short_name: price.short_name.clone(),
        regular_market_price: price.price(),
        regular_market_open: price.open(),
        regular_market_day_high: price.day_high(),
        regular_market_day_low: price.day_low(),
        regular_market_volume: price.volume(),
        regular_market_time: price.regular_market_time,
    })
}

#[async_trait]
impl QuoteSource for YahooQuoteProvider {
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
        let crumb = self.ensure_crumb().await;

        let url = format!(
            "{}/v10/finance/quoteSummary/{}",
            self.base_url,
            encode(symbol)
        );
        let mut request = self.client.get(&url).query(&[("modules", "price")]);
        if let Some(crumb) = &crumb {
            request = request
                .query(&[("crumb", crumb.crumb.as_str())])
                .header(header::COOKIE, &crumb.cookie);
        }

        let body = match send_for_text(PROVIDER_ID, symbol, request).await {
            Ok(body) => body,
            Err(e @ MarketDataError::HttpStatus { status: 401, .. }) => {
                self.clear_crumb();
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        parse_quote_summary(symbol, &body).map(RawQuote::Ticker)
    }
}
