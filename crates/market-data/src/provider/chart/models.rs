//! Chart endpoint response models.
//!
//! Mirrors put the snapshot fields at the top level of the body; Yahoo's own
//! endpoint nests the same fields under `chart.result[0].meta`. Both shapes
//! deserialize into [`ChartPayload`].

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSnapshot {
    pub symbol: Option<String>,
    pub short_name: Option<String>,
    pub regular_market_price: Option<f64>,
    pub regular_market_volume: Option<f64>,
    pub regular_market_time: Option<i64>,
    pub regular_market_change_percent: Option<f64>,
}

impl ChartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.symbol.is_none()
            && self.regular_market_price.is_none()
            && self.regular_market_volume.is_none()
            && self.regular_market_time.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChartPayload {
    #[serde(flatten)]
    pub top: ChartSnapshot,
    #[serde(default)]
    pub chart: Option<ChartBody>,
}

#[derive(Debug, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: Option<String>,
    pub description: Option<String>,
}
