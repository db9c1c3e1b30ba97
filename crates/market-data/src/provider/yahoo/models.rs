//! Yahoo Finance quoteSummary response models.
//!
//! Only the `price` module is requested; it carries the regular-market
//! snapshot the quote adapter needs.

use serde::Deserialize;

/// Main response wrapper for quoteSummary API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteSummaryResponse {
    pub quote_summary: YahooQuoteSummary,
}

/// Quote summary container. Yahoo sends `result: null` plus an `error` for unknown symbols.
#[derive(Debug, Deserialize)]
pub struct YahooQuoteSummary {
    #[serde(default)]
    pub result: Option<Vec<YahooQuoteSummaryResult>>,
    #[serde(default)]
    pub error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
pub struct YahooApiError {
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YahooQuoteSummaryResult {
    pub price: Option<YahooPriceData>,
}

/// Price data from quoteSummary API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooPriceData {
    pub symbol: Option<String>,
    pub short_name: Option<String>,
    pub regular_market_price: Option<YahooPriceDetail>,
    pub regular_market_open: Option<YahooPriceDetail>,
    pub regular_market_day_high: Option<YahooPriceDetail>,
    pub regular_market_day_low: Option<YahooPriceDetail>,
    pub regular_market_volume: Option<YahooPriceDetail>,
    pub regular_market_time: Option<i64>,
}

/// Price detail with raw and formatted values.
/// Yahoo sends `{}` when a field has no data, so `raw` is optional.
#[derive(Debug, Deserialize, Clone)]
pub struct YahooPriceDetail {
    pub raw: Option<f64>,
}

impl YahooPriceData {
    fn raw(detail: &Option<YahooPriceDetail>) -> Option<f64> {
        detail.as_ref().and_then(|d| d.raw)
    }

    pub fn price(&self) -> Option<f64> {
        Self::raw(&self.regular_market_price)
    }

    pub fn open(&self) -> Option<f64> {
        Self::raw(&self.regular_market_open)
    }

    pub fn day_high(&self) -> Option<f64> {
        Self::raw(&self.regular_market_day_high)
    }

    pub fn day_low(&self) -> Option<f64> {
        Self::raw(&self.regular_market_day_low)
    }

    pub fn volume(&self) -> Option<f64> {
        Self::raw(&self.regular_market_volume)
    }
}
