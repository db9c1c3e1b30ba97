//! Quote source abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteSource` trait that all adapters implement
//! - Pacing and HTTP configuration (`RateLimit`, `SourceOptions`)
//! - Concrete adapters: Yahoo quote API, CoinGecko simple price, Yahoo chart scraper

mod capabilities;
mod http;
mod traits;

pub mod chart;
pub mod coingecko;
pub mod yahoo;

// Re-exports
pub use capabilities::{
    RateLimit, SourceOptions, DEFAULT_MIN_DELAY, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT,
};
pub use traits::QuoteSource;
