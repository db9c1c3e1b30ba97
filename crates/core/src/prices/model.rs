//! Price domain models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Provenance class of a price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSource {
    Stock,
    Crypto,
}

impl MarketSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketSource::Stock => "stock",
            MarketSource::Crypto => "crypto",
        }
    }
}

impl fmt::Display for MarketSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stock" => Ok(MarketSource::Stock),
            "crypto" => Ok(MarketSource::Crypto),
            other => Err(Error::Parse(format!("unknown market source '{}'", other))),
        }
    }
}

/// Canonical symbol form: trimmed and uppercased.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// One daily price, the unit of ingestion.
///
/// Built fresh from every fetch and never mutated afterwards. Once it has
/// been submitted, the persisted row is the canonical copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub symbol: String,
    pub market_source: MarketSource,
    pub price_date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Decimal,
    /// Never negative.
    pub volume: Option<i64>,
}

impl PriceRecord {
    /// Create a close-only record. The symbol is normalized.
    pub fn new(
        symbol: &str,
        market_source: MarketSource,
        price_date: NaiveDate,
        close: Decimal,
    ) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            market_source,
            price_date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    pub fn with_ohl(
        mut self,
        open: Option<Decimal>,
        high: Option<Decimal>,
        low: Option<Decimal>,
    ) -> Self {
        self.open = open;
        self.high = high;
        self.low = low;
        self
    }

    /// Negative volumes are discarded.
    pub fn with_volume(mut self, volume: Option<i64>) -> Self {
        self.volume = volume.filter(|v| *v >= 0);
        self
    }

    pub fn key(&self) -> PersistedPriceKey {
        PersistedPriceKey {
            symbol: self.symbol.clone(),
            price_date: self.price_date,
        }
    }
}

/// Natural key of a persisted price.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersistedPriceKey {
    pub symbol: String,
    pub price_date: NaiveDate,
}

impl PersistedPriceKey {
    pub fn new(symbol: &str, price_date: NaiveDate) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            price_date,
        }
    }
}

impl fmt::Display for PersistedPriceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol, self.price_date)
    }
}

/// A row as it exists in the store.
///
/// `close` is nullable at the storage level even though the pipeline never
/// writes a record without one; rows loaded by other tools may lack it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPrice {
    pub symbol: String,
    pub market_source: MarketSource,
    pub price_date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<i64>,
}

impl StoredPrice {
    pub fn key(&self) -> PersistedPriceKey {
        PersistedPriceKey {
            symbol: self.symbol.clone(),
            price_date: self.price_date,
        }
    }

    /// Apply an incoming record for the same key.
    ///
    /// Fields the incoming record supplies replace stored ones; fields it
    /// leaves empty keep their stored value. Applying the same record twice
    /// yields the same row as applying it once.
    pub fn merge(&self, incoming: &PriceRecord) -> StoredPrice {
        StoredPrice {
            symbol: self.symbol.clone(),
            market_source: incoming.market_source,
            price_date: self.price_date,
            open: incoming.open.or(self.open),
            high: incoming.high.or(self.high),
            low: incoming.low.or(self.low),
            close: Some(incoming.close),
            volume: incoming.volume.or(self.volume),
        }
    }

    /// Whether this row would be flagged by the data-quality report.
    pub fn has_quality_issue(&self) -> bool {
        self.close.is_none() || self.volume.map_or(true, |v| v == 0)
    }
}

impl From<&PriceRecord> for StoredPrice {
    fn from(record: &PriceRecord) -> Self {
        StoredPrice {
            symbol: record.symbol.clone(),
            market_source: record.market_source,
            price_date: record.price_date,
            open: record.open,
            high: record.high,
            low: record.low,
            close: Some(record.close),
            volume: record.volume,
        }
    }
}

/// Result of a successful upsert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    /// No row existed for the key.
    Inserted,
    /// A row existed and the incoming fields were merged into it.
    Updated,
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertOutcome::Inserted => write!(f, "inserted"),
            UpsertOutcome::Updated => write!(f, "updated"),
        }
    }
}

/// Per-symbol data-quality summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSummary {
    pub symbol: String,
    pub market_source: MarketSource,
    pub record_count: i64,
    pub earliest_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
    pub null_close_count: i64,
    /// Rows whose volume is zero or missing.
    pub missing_volume_count: i64,
}
