use serde::{Deserialize, Serialize};

/// A quote exactly as a source reported it, before normalization.
///
/// Prices stay as the provider's floating point numbers here. Conversion to
/// decimals, date derivation and validation belong to the normalizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RawQuote {
    /// Stock/crypto quote API (regular market fields).
    Ticker(TickerQuote),
    /// Aggregator "simple price" entry for one identifier.
    SimplePrice(SimplePriceQuote),
    /// Chart-style scraper payload with top-level fields.
    Chart(ChartQuote),
}

impl RawQuote {
    /// The symbol or identifier this quote was fetched for.
    pub fn symbol(&self) -> &str {
        match self {
            Self::Ticker(q) => &q.symbol,
            Self::SimplePrice(q) => &q.id,
            Self::Chart(q) => &q.symbol,
        }
    }

    /// Provider timestamp in unix seconds, when the payload carried one.
    pub fn observed_at(&self) -> Option<i64> {
        match self {
            Self::Ticker(q) => q.regular_market_time,
            Self::SimplePrice(q) => q.last_updated_at,
            Self::Chart(q) => q.timestamp,
        }
    }
}

/// Regular-market snapshot from the quote API.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerQuote {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    pub regular_market_price: Option<f64>,
    pub regular_market_open: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub regular_market_volume: Option<f64>,
    /// Unix seconds of the last regular-market trade.
    pub regular_market_time: Option<i64>,
}

/// One identifier's entry from a batched simple-price response.
///
/// Only entries that carried a numeric price for `vs_currency` are ever
/// constructed, so `price` is not optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimplePriceQuote {
    /// Aggregator identifier (e.g. "bitcoin")
    pub id: String,
    /// Lowercase quote currency (e.g. "usd")
    pub vs_currency: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
    /// Unix seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<i64>,
}

/// Chart endpoint payload reduced to its top-level fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartQuote {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    pub price: Option<f64>,
    pub volume: Option<f64>,
    /// Unix seconds
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
}
