//! CoinGecko simple price adapter.
//!
//! One `/simple/price` request covers many coin identifiers. The response
//! maps each identifier to a currency-keyed price object; identifiers the
//! API omits, or that lack a numeric price for the quote currency, are
//! dropped from the result instead of failing the batch.
//!
//! - Public API: no key, tight limits
//! - Demo API: `CG-` prefixed key, sent as `x-cg-demo-api-key`
//! - Pro API: any other key, separate host, sent as `x-cg-pro-api-key`

mod models;

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{RawQuote, SimplePriceQuote};
use crate::pacing::Pacer;
use crate::provider::http::{build_client, send_for_text};
use crate::provider::{QuoteSource, RateLimit, SourceOptions};

use models::{SimplePriceEntry, SimplePriceResponse};

const PROVIDER_ID: &str = "COINGECKO";
const PUBLIC_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PRO_BASE_URL: &str = "https://pro-api.coingecko.com/api/v3";

/// Identifiers per request; longer lists are split into several paced requests.
const MAX_IDS_PER_REQUEST: usize = 250;

fn default_base_url(api_key: Option<&str>) -> &'static str {
    match api_key {
        Some(key) if !key.starts_with("CG-") => PRO_BASE_URL,
        _ => PUBLIC_BASE_URL,
    }
}

/// CoinGecko batch price adapter.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    vs_currency: String,
    pacer: Pacer,
}

impl CoinGeckoProvider {
    pub fn new(
        options: SourceOptions,
        vs_currency: &str,
        api_key: Option<String>,
    ) -> Result<Self, MarketDataError> {
        let vs_currency = vs_currency.trim().to_lowercase();
        if vs_currency.is_empty() {
            return Err(MarketDataError::InvalidRequest(
                "empty quote currency".to_string(),
            ));
        }

        let api_key = api_key.filter(|k| !k.trim().is_empty());
        let client = build_client(PROVIDER_ID, &options)?;

        Ok(Self {
            client,
            base_url: options.resolve_base_url(default_base_url(api_key.as_deref())),
            api_key,
            vs_currency,
            pacer: Pacer::new(PROVIDER_ID, options.min_delay),
        })
    }

    pub fn vs_currency(&self) -> &str {
        &self.vs_currency
    }

    async fn request_chunk(&self, ids: &[String]) -> Result<String, MarketDataError> {
        let joined = ids
            .iter()
            .map(|id| id.to_lowercase())
            .collect::<Vec<_>>()
            .join(",");

        let mut request = self.client.get(format!("{}/simple/price", self.base_url)).query(&[
            ("ids", joined.as_str()),
            ("vs_currencies", self.vs_currency.as_str()),
            ("include_24hr_vol", "true"),
            ("include_last_updated_at", "true"),
        ]);

        if let Some(key) = &self.api_key {
            let header = if key.starts_with("CG-") {
                "x-cg-demo-api-key"
            } else {
                "x-cg-pro-api-key"
            };
            request = request.header(header, key);
        }

        self.pacer.wait().await;
        send_for_text(PROVIDER_ID, &joined, request).await
    }
}

/// Parse a `/simple/price` body into one quote per requested identifier.
///
/// The returned map is keyed by the identifiers as requested. Identifiers
/// missing from the body, whose entry is not a coin object of numbers, or
/// without a `vs_currency` price are left out. Only a body that is not an
/// identifier-keyed object fails the batch.
pub fn parse_simple_price(
    requested: &[String],
    vs_currency: &str,
    body: &str,
) -> Result<HashMap<String, SimplePriceQuote>, MarketDataError> {
    let response: SimplePriceResponse = serde_json::from_str(body).map_err(|e| {
        MarketDataError::malformed(PROVIDER_ID, format!("simple price response: {}", e))
    })?;

    let vs_currency = vs_currency.to_lowercase();
    let mut quotes = HashMap::with_capacity(requested.len());

    for id in requested {
        let Some(entry) = response.get(&id.to_lowercase()) else {
            debug!("CoinGecko returned no entry for '{}'", id);
            continue;
        };

        let coin = match entry {
            SimplePriceEntry::Coin(coin) => coin,
            SimplePriceEntry::Unusable(_) => {
                warn!("CoinGecko entry for '{}' is not a price object", id);
                continue;
            }
        };

        let Some(price) = coin.price(&vs_currency) else {
            warn!("CoinGecko entry for '{}' has no '{}' price", id, vs_currency);
            continue;
        };

        quotes.insert(
            id.clone(),
            SimplePriceQuote {
                id: id.clone(),
                vs_currency: vs_currency.clone(),
                price,
                volume_24h: coin.volume_24h(&vs_currency),
                last_updated_at: coin.last_updated_at,
            },
        );
    }

    Ok(quotes)
}

#[async_trait]
impl QuoteSource for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            min_delay: self.pacer.min_delay(),
            max_batch_size: MAX_IDS_PER_REQUEST,
        }
    }

    fn supports_batch(&self) -> bool {
        true
    }

    async fn fetch(&self, symbol: &str) -> Result<RawQuote, MarketDataError> {
        let id = symbol.trim().to_string();
        let mut quotes = self.fetch_batch(std::slice::from_ref(&id)).await?;
        quotes
            .remove(&id)
            .ok_or(MarketDataError::SymbolNotFound(id))
    }

    async fn fetch_batch(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, RawQuote>, MarketDataError> {
        let mut ids: Vec<String> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let id = symbol.trim();
            if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
            }
        }

        if ids.is_empty() {
            return Err(MarketDataError::InvalidRequest(
                "no identifiers requested".to_string(),
            ));
        }

        let mut quotes = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let body = self.request_chunk(chunk).await?;
            let parsed = parse_simple_price(chunk, &self.vs_currency, &body)?;
            debug!(
                "CoinGecko returned {} of {} requested identifiers",
                parsed.len(),
                chunk.len()
            );
            quotes.extend(
                parsed
                    .into_iter()
                    .map(|(id, quote)| (id, RawQuote::SimplePrice(quote))),
            );
        }

        Ok(quotes)
    }
}
