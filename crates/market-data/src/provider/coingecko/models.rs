//! CoinGecko simple price response models.

use std::collections::HashMap;

use serde::de::IgnoredAny;
use serde::Deserialize;

/// `/simple/price` body: coin identifier to its entry.
pub type SimplePriceResponse = HashMap<String, SimplePriceEntry>;

/// One identifier's entry. Anything that is not a well-typed coin object
/// is kept as `Unusable` so it can be skipped without failing the batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SimplePriceEntry {
    Coin(CoinPrice),
    Unusable(IgnoredAny),
}

/// Per-coin prices keyed by lowercase currency.
///
/// Alongside `usd` the map holds flag-driven keys such as `usd_24h_vol`.
/// Every value must be a number or null.
#[derive(Debug, Deserialize)]
pub struct CoinPrice {
    #[serde(default)]
    pub last_updated_at: Option<i64>,
    #[serde(flatten)]
    pub by_currency: HashMap<String, Option<f64>>,
}

impl CoinPrice {
    pub fn price(&self, vs_currency: &str) -> Option<f64> {
        self.by_currency.get(vs_currency).copied().flatten()
    }

    pub fn volume_24h(&self, vs_currency: &str) -> Option<f64> {
        self.by_currency
            .get(&format!("{}_24h_vol", vs_currency))
            .copied()
            .flatten()
    }
}
