//! Pricesync Market Data Crate
//!
//! Source adapters for the price ingestion pipeline. Each adapter wraps one
//! external provider behind the [`QuoteSource`] trait and returns provider
//! payloads as [`RawQuote`] values.
//!
//! # Overview
//!
//! - [`YahooQuoteProvider`]: stock/crypto quote API, one paced request per symbol
//! - [`CoinGeckoProvider`]: aggregator simple price, one request per batch of ids
//! - [`ChartScraperProvider`]: chart-style scraper, one paced request per symbol
//!
//! # Errors
//!
//! Every failure is a [`MarketDataError`] and classifies as either a
//! transport or a protocol failure through [`MarketDataError::kind`].

pub mod errors;
pub mod models;
pub mod pacing;
pub mod provider;

pub use errors::{MarketDataError, SourceErrorKind};
pub use models::{ChartQuote, RawQuote, SimplePriceQuote, TickerQuote};
pub use pacing::Pacer;

pub use provider::chart::ChartScraperProvider;
pub use provider::coingecko::CoinGeckoProvider;
pub use provider::yahoo::YahooQuoteProvider;
pub use provider::{QuoteSource, RateLimit, SourceOptions};
