//! Reconciler: idempotent, merge-not-clobber writes.
//!
//! The merge itself is enforced by the store (see
//! [`PriceStore::upsert_price`]); this layer owns logging and the
//! record-level checks that must hold before anything reaches the store.

use std::sync::Arc;

use log::debug;

use super::model::{normalize_symbol, PriceRecord, UpsertOutcome};
use super::store::PriceStore;
use crate::errors::{Error, Result};

#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn PriceStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn PriceStore>) -> Self {
        Self { store }
    }

    /// Upsert a record by (symbol, price_date).
    pub async fn upsert(&self, record: &PriceRecord) -> Result<UpsertOutcome> {
        if record.symbol.is_empty() || record.symbol != normalize_symbol(&record.symbol) {
            return Err(Error::Unexpected(format!(
                "record symbol '{}' is not normalized",
                record.symbol
            )));
        }
        if record.volume.is_some_and(|v| v < 0) {
            return Err(Error::Unexpected(format!(
                "record {} has negative volume",
                record.key()
            )));
        }

        let outcome = self.store.upsert_price(record).await?;
        debug!("Upsert {} -> {}", record.key(), outcome);
        Ok(outcome)
    }
}
