use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};
use log::debug;
use std::sync::Arc;

use super::model::{format_date, parse_date, NewPriceDB, PriceDB, SymbolSummaryDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::prices::dsl as prices_dsl;
use pricesync_core::prices::{
    PersistedPriceKey, PriceRecord, PriceStore, StoredPrice, SymbolSummary, UpsertOutcome,
};
use pricesync_core::Result;

// Absent incoming fields keep the stored value. The source is always replaced.
const UPSERT_PRICE_SQL: &str = "
    INSERT INTO prices
        (symbol, price_date, open_price, high_price, low_price, close_price, volume, market_source)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (symbol, price_date) DO UPDATE SET
        open_price = COALESCE(excluded.open_price, prices.open_price),
        high_price = COALESCE(excluded.high_price, prices.high_price),
        low_price = COALESCE(excluded.low_price, prices.low_price),
        close_price = COALESCE(excluded.close_price, prices.close_price),
        volume = COALESCE(excluded.volume, prices.volume),
        market_source = excluded.market_source
";

const SYMBOL_SUMMARY_SQL: &str = "
    SELECT
        p.symbol AS symbol,
        (SELECT l.market_source FROM prices l
            WHERE l.symbol = p.symbol
            ORDER BY l.price_date DESC LIMIT 1) AS market_source,
        COUNT(*) AS record_count,
        MIN(p.price_date) AS earliest_date,
        MAX(p.price_date) AS latest_date,
        SUM(CASE WHEN p.close_price IS NULL THEN 1 ELSE 0 END) AS null_close_count,
        SUM(CASE WHEN p.volume IS NULL OR p.volume = 0 THEN 1 ELSE 0 END) AS missing_volume_count
    FROM prices p
    GROUP BY p.symbol
    ORDER BY p.symbol
";

pub struct PriceRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PriceRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PriceStore for PriceRepository {
    async fn upsert_price(&self, record: &PriceRecord) -> Result<UpsertOutcome> {
        let row = NewPriceDB::from(record);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<UpsertOutcome> {
                let existing: i64 = prices_dsl::prices
                    .filter(prices_dsl::symbol.eq(&row.symbol))
                    .filter(prices_dsl::price_date.eq(&row.price_date))
                    .count()
                    .get_result(conn)
                    .into_core()?;

                sql_query(UPSERT_PRICE_SQL)
                    .bind::<Text, _>(row.symbol.clone())
                    .bind::<Text, _>(row.price_date.clone())
                    .bind::<Nullable<Text>, _>(row.open_price.clone())
                    .bind::<Nullable<Text>, _>(row.high_price.clone())
                    .bind::<Nullable<Text>, _>(row.low_price.clone())
                    .bind::<Text, _>(row.close_price.clone())
                    .bind::<Nullable<BigInt>, _>(row.volume)
                    .bind::<Text, _>(row.market_source.clone())
                    .execute(conn)
                    .into_core()?;

                let outcome = if existing > 0 {
                    UpsertOutcome::Updated
                } else {
                    UpsertOutcome::Inserted
                };
                debug!("{} {}@{}", outcome, row.symbol, row.price_date);
                Ok(outcome)
            })
            .await
    }

    fn latest_price_date(&self, symbol: &str) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let latest: Option<String> = prices_dsl::prices
            .filter(prices_dsl::symbol.eq(symbol))
            .select(max(prices_dsl::price_date))
            .get_result(&mut conn)
            .into_core()?;

        latest.as_deref().map(parse_date).transpose()
    }

    fn get_price(&self, key: &PersistedPriceKey) -> Result<Option<StoredPrice>> {
        let mut conn = get_connection(&self.pool)?;
        let row = prices_dsl::prices
            .filter(prices_dsl::symbol.eq(&key.symbol))
            .filter(prices_dsl::price_date.eq(format_date(key.price_date)))
            .select(PriceDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;

        row.map(StoredPrice::try_from).transpose()
    }

    fn prices_since(&self, since: NaiveDate) -> Result<Vec<StoredPrice>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = prices_dsl::prices
            .filter(prices_dsl::price_date.ge(format_date(since)))
            .order((prices_dsl::price_date.desc(), prices_dsl::symbol.asc()))
            .select(PriceDB::as_select())
            .load::<PriceDB>(&mut conn)
            .into_core()?;

        rows.into_iter().map(StoredPrice::try_from).collect()
    }

    fn symbol_summaries(&self) -> Result<Vec<SymbolSummary>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sql_query(SYMBOL_SUMMARY_SQL)
            .load::<SymbolSummaryDB>(&mut conn)
            .into_core()?;

        rows.into_iter().map(SymbolSummary::try_from).collect()
    }

    fn quality_issues(&self, limit: i64) -> Result<Vec<StoredPrice>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = prices_dsl::prices
            .filter(
                prices_dsl::close_price
                    .is_null()
                    .or(prices_dsl::volume.is_null())
                    .or(prices_dsl::volume.eq(0i64)),
            )
            .order((prices_dsl::price_date.desc(), prices_dsl::symbol.asc()))
            .limit(limit.max(0))
            .select(PriceDB::as_select())
            .load::<PriceDB>(&mut conn)
            .into_core()?;

        rows.into_iter().map(StoredPrice::try_from).collect()
    }
}
