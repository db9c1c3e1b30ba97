//! Database models for daily prices.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text};
use rust_decimal::Decimal;
use std::str::FromStr;

use pricesync_core::prices::{MarketSource, PriceRecord, StoredPrice, SymbolSummary};
use pricesync_core::{Error, Result};

/// Dates are stored as ISO `YYYY-MM-DD` text so that string order is date order.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value, DATE_FORMAT)?)
}

fn parse_decimal(value: Option<&str>) -> Result<Option<Decimal>> {
    value.map(Decimal::from_str).transpose().map_err(Error::from)
}

/// Database model for a stored price row.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceDB {
    pub id: i32,
    pub symbol: String,
    pub price_date: String,
    pub open_price: Option<String>,
    pub high_price: Option<String>,
    pub low_price: Option<String>,
    pub close_price: Option<String>,
    pub volume: Option<i64>,
    pub market_source: String,
    pub created_at: String,
}

impl TryFrom<PriceDB> for StoredPrice {
    type Error = Error;

    fn try_from(db: PriceDB) -> Result<Self> {
        Ok(StoredPrice {
            market_source: MarketSource::from_str(&db.market_source)?,
            price_date: parse_date(&db.price_date)?,
            open: parse_decimal(db.open_price.as_deref())?,
            high: parse_decimal(db.high_price.as_deref())?,
            low: parse_decimal(db.low_price.as_deref())?,
            close: parse_decimal(db.close_price.as_deref())?,
            volume: db.volume,
            symbol: db.symbol,
        })
    }
}

/// Column values bound into the upsert statement.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPriceDB {
    pub symbol: String,
    pub price_date: String,
    pub open_price: Option<String>,
    pub high_price: Option<String>,
    pub low_price: Option<String>,
    pub close_price: String,
    pub volume: Option<i64>,
    pub market_source: String,
}

impl From<&PriceRecord> for NewPriceDB {
    fn from(record: &PriceRecord) -> Self {
        NewPriceDB {
            symbol: record.symbol.clone(),
            price_date: format_date(record.price_date),
            open_price: record.open.map(|d| d.to_string()),
            high_price: record.high.map(|d| d.to_string()),
            low_price: record.low.map(|d| d.to_string()),
            close_price: record.close.to_string(),
            volume: record.volume,
            market_source: record.market_source.as_str().to_string(),
        }
    }
}

/// Per-symbol aggregate row.
#[derive(QueryableByName, Debug, Clone)]
pub struct SymbolSummaryDB {
    #[diesel(sql_type = Text)]
    pub symbol: String,
    #[diesel(sql_type = Text)]
    pub market_source: String,
    #[diesel(sql_type = BigInt)]
    pub record_count: i64,
    #[diesel(sql_type = Nullable<Text>)]
    pub earliest_date: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub latest_date: Option<String>,
    #[diesel(sql_type = BigInt)]
    pub null_close_count: i64,
    #[diesel(sql_type = BigInt)]
    pub missing_volume_count: i64,
}

impl TryFrom<SymbolSummaryDB> for SymbolSummary {
    type Error = Error;

    fn try_from(db: SymbolSummaryDB) -> Result<Self> {
        Ok(SymbolSummary {
            market_source: MarketSource::from_str(&db.market_source)?,
            record_count: db.record_count,
            earliest_date: db.earliest_date.as_deref().map(parse_date).transpose()?,
            latest_date: db.latest_date.as_deref().map(parse_date).transpose()?,
            null_close_count: db.null_close_count,
            missing_volume_count: db.missing_volume_count,
            symbol: db.symbol,
        })
    }
}
