//! Price storage trait.
//!
//! Abstracts the persistence layer so the pipeline can run against SQLite
//! in production and in-memory stores in tests.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::{PersistedPriceKey, PriceRecord, StoredPrice, SymbolSummary, UpsertOutcome};
use crate::errors::Result;

/// Storage interface for daily prices.
///
/// Writes are async because implementations serialize them through a
/// single writer. Reads are sync and expected to be fast.
///
/// Implementations must guarantee that at most one row exists per
/// (symbol, price_date), and that [`upsert_price`](Self::upsert_price)
/// merges without clobbering: a `None` field on the incoming record leaves
/// the stored value untouched.
#[async_trait]
pub trait PriceStore: Send + Sync {
    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert the record, or merge it into the existing row for its key.
    ///
    /// Same-key writers must observe a single consistent final state, and
    /// submitting an identical record twice must leave the row unchanged.
    async fn upsert_price(&self, record: &PriceRecord) -> Result<UpsertOutcome>;

    // =========================================================================
    // Queries
    // =========================================================================

    /// Latest persisted `price_date` for a symbol, or `None` if it has no rows.
    fn latest_price_date(&self, symbol: &str) -> Result<Option<NaiveDate>>;

    /// Row for a key, if present.
    fn get_price(&self, key: &PersistedPriceKey) -> Result<Option<StoredPrice>>;

    /// Rows dated on or after `since`, newest first.
    fn prices_since(&self, since: NaiveDate) -> Result<Vec<StoredPrice>>;

    // =========================================================================
    // Data quality
    // =========================================================================

    /// One summary per symbol, ordered by symbol.
    fn symbol_summaries(&self) -> Result<Vec<SymbolSummary>>;

    /// Rows with a null close or a zero/null volume, newest first.
    fn quality_issues(&self, limit: i64) -> Result<Vec<StoredPrice>>;
}
