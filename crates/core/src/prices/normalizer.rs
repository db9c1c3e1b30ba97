//! Conversion of provider payloads into canonical price records.
//!
//! [`normalize`] is pure: the processing date and timezone come in through
//! [`NormalizeContext`], never from the clock.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use log::warn;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;

use pricesync_market_data::{ChartQuote, RawQuote, SimplePriceQuote, TickerQuote};

use super::model::{normalize_symbol, MarketSource, PriceRecord};
use crate::errors::NormalizationError;

/// Date inputs for one ingestion cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizeContext {
    /// Processing date used when a quote carries no timestamp.
    pub today: NaiveDate,
    /// Market timezone used to turn provider timestamps into calendar dates.
    pub timezone: Tz,
}

impl NormalizeContext {
    pub fn new(today: NaiveDate, timezone: Tz) -> Self {
        Self { today, timezone }
    }

    /// Context whose `today` is the current date in `timezone`.
    pub fn now_in(timezone: Tz) -> Self {
        Self {
            today: Utc::now().with_timezone(&timezone).date_naive(),
            timezone,
        }
    }

    /// Calendar date of a unix timestamp in the market timezone.
    ///
    /// Falls back to `today` for timestamps chrono cannot represent.
    pub fn date_of(&self, unix_seconds: Option<i64>) -> NaiveDate {
        unix_seconds
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .map(|dt| dt.with_timezone(&self.timezone).date_naive())
            .unwrap_or(self.today)
    }
}

/// Field set shared by every payload shape once names are mapped.
struct Fields<'a> {
    symbol: &'a str,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

impl<'a> From<&'a TickerQuote> for Fields<'a> {
    fn from(q: &'a TickerQuote) -> Self {
        Fields {
            symbol: &q.symbol,
            open: q.regular_market_open,
            high: q.regular_market_day_high,
            low: q.regular_market_day_low,
            close: q.regular_market_price,
            volume: q.regular_market_volume,
        }
    }
}

impl<'a> From<&'a SimplePriceQuote> for Fields<'a> {
    fn from(q: &'a SimplePriceQuote) -> Self {
        Fields {
            symbol: &q.id,
            open: None,
            high: None,
            low: None,
            close: Some(q.price),
            volume: q.volume_24h,
        }
    }
}

impl<'a> From<&'a ChartQuote> for Fields<'a> {
    fn from(q: &'a ChartQuote) -> Self {
        Fields {
            symbol: &q.symbol,
            open: None,
            high: None,
            low: None,
            close: q.price,
            volume: q.volume,
        }
    }
}

/// Shortest round-trip text first, so 189.84 stays 189.84 instead of its
/// binary expansion. Magnitudes beyond the text parser use the lossy path.
fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .map(|d| d.normalize())
}

fn to_volume(symbol: &str, value: Option<f64>) -> Option<i64> {
    let value = value?;
    if !value.is_finite() || value < 0.0 {
        warn!("Discarding invalid volume {} for {}", value, symbol);
        return None;
    }
    // Saturates at i64::MAX.
    Some(value.floor() as i64)
}

/// Convert a raw quote into a [`PriceRecord`].
///
/// `price_date` is the provider timestamp's date in the context timezone,
/// or the context's `today` when the payload has none. A missing or
/// non-numeric close is an error; suspicious but numeric values are logged
/// and kept.
pub fn normalize(
    raw: &RawQuote,
    market_source: MarketSource,
    ctx: &NormalizeContext,
) -> Result<PriceRecord, NormalizationError> {
    let fields = match raw {
        RawQuote::Ticker(q) => Fields::from(q),
        RawQuote::SimplePrice(q) => Fields::from(q),
        RawQuote::Chart(q) => Fields::from(q),
    };

    let symbol = normalize_symbol(fields.symbol);
    if symbol.is_empty() {
        return Err(NormalizationError::MissingSymbol);
    }

    let close_raw = fields
        .close
        .ok_or_else(|| NormalizationError::MissingClose(symbol.clone()))?;
    let close = to_decimal(close_raw).ok_or_else(|| NormalizationError::NonNumericClose {
        symbol: symbol.clone(),
        value: close_raw.to_string(),
    })?;

    let open = fields.open.and_then(to_decimal);
    let high = fields.high.and_then(to_decimal);
    let low = fields.low.and_then(to_decimal);
    let volume = to_volume(&symbol, fields.volume);

    if close <= Decimal::ZERO {
        warn!("Non-positive close {} for {}", close, symbol);
    }
    if let (Some(h), Some(l)) = (high, low) {
        if h < l {
            warn!("High {} below low {} for {}", h, l, symbol);
        }
    }

    let price_date = ctx.date_of(raw.observed_at());

    Ok(PriceRecord::new(&symbol, market_source, price_date, close)
        .with_ohl(open, high, low)
        .with_volume(volume))
}
