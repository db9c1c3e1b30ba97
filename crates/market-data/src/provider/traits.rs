//! Quote source trait definition.
//!
//! Every external price provider is wrapped behind [`QuoteSource`] so the
//! ingestion pipeline never sees provider-specific request or payload details.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

use crate::errors::MarketDataError;
use crate::models::RawQuote;

use super::capabilities::RateLimit;

/// Trait for quote sources.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use pricesync_market_data::{MarketDataError, QuoteSource, RateLimit, RawQuote};
///
/// struct FixedSource;
///
/// #[async_trait]
/// impl QuoteSource for FixedSource {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     fn rate_limit(&self) -> RateLimit {
///         RateLimit::default()
///     }
///
///     async fn fetch(&self, symbol: &str) -> Result<RawQuote, MarketDataError> {
///         // ...
///     }
/// }
/// ```
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Unique identifier for this source, e.g. "YAHOO_QUOTE" or "COINGECKO".
    ///
    /// Used in logs and in failure reports.
    fn id(&self) -> &'static str;

    /// Pacing and batching limits for this source.
    fn rate_limit(&self) -> RateLimit;

    /// Fetch the current quote for a single symbol or identifier.
    ///
    /// Paced sources wait out their minimum delay before sending.
    async fn fetch(&self, symbol: &str) -> Result<RawQuote, MarketDataError>;

    /// Whether [`fetch_batch`](Self::fetch_batch) issues a single request
    /// for many identifiers.
    fn supports_batch(&self) -> bool {
        false
    }

    /// Fetch quotes for several identifiers.
    ///
    /// The result is keyed by the requested identifier. Identifiers the
    /// provider had no usable data for are absent from the map rather than
    /// failing the call.
    ///
    /// The default implementation fetches sequentially through
    /// [`fetch`](Self::fetch) and drops per-symbol failures.
    async fn fetch_batch(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, RawQuote>, MarketDataError> {
        let mut quotes = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            match self.fetch(symbol).await {
                Ok(quote) => {
                    quotes.insert(symbol.clone(), quote);
                }
                Err(e) => warn!("{}: dropping {} from batch: {}", self.id(), symbol, e),
            }
        }
        Ok(quotes)
    }
}
