//! Market data models
//!
//! - `raw_quote` - Provider payloads lifted into one closed enum (`RawQuote`)

mod raw_quote;

pub use raw_quote::{ChartQuote, RawQuote, SimplePriceQuote, TickerQuote};
