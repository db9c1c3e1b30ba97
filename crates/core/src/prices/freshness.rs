//! Freshness gate: decides whether a candidate price needs writing.

use std::sync::Arc;

use chrono::NaiveDate;
use log::debug;

use super::model::normalize_symbol;
use super::store::PriceStore;
use crate::errors::Result;

/// Pure decision rule behind [`FreshnessGate::is_stale`].
///
/// A write is needed when nothing is stored yet, or when the latest stored
/// date is strictly earlier than the candidate.
pub fn needs_write(latest: Option<NaiveDate>, candidate: NaiveDate) -> bool {
    match latest {
        None => true,
        Some(latest) => latest < candidate,
    }
}

/// Consults persisted state before a write.
#[derive(Clone)]
pub struct FreshnessGate {
    store: Arc<dyn PriceStore>,
}

impl FreshnessGate {
    pub fn new(store: Arc<dyn PriceStore>) -> Self {
        Self { store }
    }

    /// Whether the store is behind `candidate` for `symbol`.
    ///
    /// Fails closed: a store error is returned, never read as "fresh" or
    /// "stale".
    pub fn is_stale(&self, symbol: &str, candidate: NaiveDate) -> Result<bool> {
        let symbol = normalize_symbol(symbol);
        let latest = self.store.latest_price_date(&symbol)?;
        let stale = needs_write(latest, candidate);
        debug!(
            "Freshness {}: latest={:?} candidate={} stale={}",
            symbol, latest, candidate, stale
        );
        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_needs_write_rule() {
        assert!(needs_write(None, day(10)));
        assert!(needs_write(Some(day(9)), day(10)));
        assert!(!needs_write(Some(day(10)), day(10)));
        assert!(!needs_write(Some(day(11)), day(10)));
    }
}
