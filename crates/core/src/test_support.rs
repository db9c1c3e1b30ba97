//! In-memory doubles shared by the pipeline and orchestrator tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;

use pricesync_market_data::{
    MarketDataError, QuoteSource, RateLimit, RawQuote, SimplePriceQuote, TickerQuote,
};

use crate::errors::{DatabaseError, Result};
use crate::prices::{
    NormalizeContext, PersistedPriceKey, PriceRecord, PriceStore, StoredPrice, SymbolSummary,
    UpsertOutcome,
};

// =========================================================================
// Mock PriceStore
// =========================================================================

#[derive(Clone, Default)]
pub struct MockPriceStore {
    rows: Arc<Mutex<BTreeMap<PersistedPriceKey, StoredPrice>>>,
    fail_reads_for: Arc<Mutex<HashSet<String>>>,
    fail_writes_for: Arc<Mutex<HashSet<String>>>,
    write_delay: Arc<Mutex<Option<Duration>>>,
    writes: Arc<Mutex<usize>>,
}

impl MockPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<StoredPrice>) -> Self {
        let store = Self::default();
        {
            let mut map = store.rows.lock().unwrap();
            for row in rows {
                map.insert(row.key(), row);
            }
        }
        store
    }

    pub fn fail_reads_for(&self, symbol: &str) {
        self.fail_reads_for
            .lock()
            .unwrap()
            .insert(symbol.to_uppercase());
    }

    pub fn fail_writes_for(&self, symbol: &str) {
        self.fail_writes_for
            .lock()
            .unwrap()
            .insert(symbol.to_uppercase());
    }

    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = Some(delay);
    }

    pub fn get_all(&self) -> Vec<StoredPrice> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl PriceStore for MockPriceStore {
    async fn upsert_price(&self, record: &PriceRecord) -> Result<UpsertOutcome> {
        if self.fail_writes_for.lock().unwrap().contains(&record.symbol) {
            return Err(DatabaseError::QueryFailed("Intentional write failure".into()).into());
        }

        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        *self.writes.lock().unwrap() += 1;
        let mut rows = self.rows.lock().unwrap();
        let key = record.key();
        match rows.get(&key) {
            Some(existing) => {
                let merged = existing.merge(record);
                rows.insert(key, merged);
                Ok(UpsertOutcome::Updated)
            }
            None => {
                rows.insert(key, StoredPrice::from(record));
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    fn latest_price_date(&self, symbol: &str) -> Result<Option<NaiveDate>> {
        if self.fail_reads_for.lock().unwrap().contains(symbol) {
            return Err(DatabaseError::ConnectionFailed("Intentional read failure".into()).into());
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.symbol == symbol)
            .map(|k| k.price_date)
            .max())
    }

    fn get_price(&self, key: &PersistedPriceKey) -> Result<Option<StoredPrice>> {
        Ok(self.rows.lock().unwrap().get(key).cloned())
    }

    fn prices_since(&self, since: NaiveDate) -> Result<Vec<StoredPrice>> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.price_date >= since)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.price_date.cmp(&a.price_date));
        Ok(rows)
    }

    fn symbol_summaries(&self) -> Result<Vec<SymbolSummary>> {
        Ok(Vec::new())
    }

    fn quality_issues(&self, limit: i64) -> Result<Vec<StoredPrice>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.has_quality_issue())
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

// =========================================================================
// Mock QuoteSource
// =========================================================================

pub struct MockQuoteSource {
    id: &'static str,
    batch: bool,
    responses: Mutex<HashMap<String, std::result::Result<RawQuote, MarketDataError>>>,
    batch_error: Mutex<Option<MarketDataError>>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockQuoteSource {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            batch: false,
            responses: Mutex::new(HashMap::new()),
            batch_error: Mutex::new(None),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn batched(id: &'static str) -> Self {
        Self {
            batch: true,
            ..Self::new(id)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(self, symbol: &str, response: std::result::Result<RawQuote, MarketDataError>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(symbol.to_string(), response);
        self
    }

    pub fn fail_batch(self, error: MarketDataError) -> Self {
        *self.batch_error.lock().unwrap() = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    fn id(&self) -> &'static str {
        self.id
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit::default()
    }

    fn supports_batch(&self) -> bool {
        self.batch
    }

    async fn fetch(&self, symbol: &str) -> std::result::Result<RawQuote, MarketDataError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Err(MarketDataError::SymbolNotFound(symbol.to_string())))
    }

    async fn fetch_batch(
        &self,
        symbols: &[String],
    ) -> std::result::Result<HashMap<String, RawQuote>, MarketDataError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("batch:{}", symbols.join(",")));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.batch_error.lock().unwrap().clone() {
            return Err(error);
        }
        let responses = self.responses.lock().unwrap();
        Ok(symbols
            .iter()
            .filter_map(|s| match responses.get(s) {
                Some(Ok(raw)) => Some((s.clone(), raw.clone())),
                _ => None,
            })
            .collect())
    }
}

// =========================================================================
// Fixtures
// =========================================================================

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

pub fn dates(today: NaiveDate) -> NormalizeContext {
    NormalizeContext::new(today, Tz::UTC)
}

pub fn ticker(symbol: &str, price: f64) -> RawQuote {
    RawQuote::Ticker(TickerQuote {
        symbol: symbol.to_string(),
        regular_market_price: Some(price),
        regular_market_open: Some(price - 1.0),
        regular_market_day_high: Some(price + 1.0),
        regular_market_day_low: Some(price - 2.0),
        regular_market_volume: Some(1_000_000.0),
        ..Default::default()
    })
}

pub fn simple_price(id: &str, price: f64) -> RawQuote {
    RawQuote::SimplePrice(SimplePriceQuote {
        id: id.to_string(),
        vs_currency: "usd".to_string(),
        price,
        volume_24h: None,
        last_updated_at: None,
    })
}
