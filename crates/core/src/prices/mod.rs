//! Daily price model and the per-symbol pipeline stages.
//!
//! - `model` - `PriceRecord`, keys, stored rows and summaries
//! - `normalizer` - `RawQuote` to `PriceRecord`
//! - `store` - `PriceStore` trait implemented by the storage crate
//! - `freshness` - stale/fresh decision against persisted state
//! - `reconciler` - idempotent upsert

mod freshness;
mod model;
mod normalizer;
mod reconciler;
mod store;


pub use freshness::{needs_write, FreshnessGate};
pub use model::{
    normalize_symbol, MarketSource, PersistedPriceKey, PriceRecord, StoredPrice, SymbolSummary,
    UpsertOutcome,
};
pub use normalizer::{normalize, NormalizeContext};
pub use reconciler::Reconciler;
pub use store::PriceStore;
