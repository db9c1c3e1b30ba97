//! Pricesync Core - price pipeline domain, stages and traits.
//!
//! This crate is database-agnostic. It defines the [`prices::PriceStore`]
//! trait that the `storage-sqlite` crate implements, and drives quote
//! sources from the `market-data` crate through normalization, the
//! freshness gate and the reconciler.

pub mod errors;
pub mod ingest;
pub mod prices;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
