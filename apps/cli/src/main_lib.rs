use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tokio::time::Instant;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, LogFormat};
use pricesync_core::ingest::{
    CancelSignal, CycleContext, CycleSummary, IngestionOrchestrator, SourceBinding,
};
use pricesync_core::prices::{MarketSource, NormalizeContext, PriceStore, StoredPrice, SymbolSummary};
use pricesync_market_data::{
    ChartScraperProvider, CoinGeckoProvider, QuoteSource, SourceOptions, YahooQuoteProvider,
};
use pricesync_storage_sqlite::PriceDatabase;

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

/// One binding per configured symbol list. The quote API client is shared
/// by its stock and crypto bindings so both draw from the same pacer.
pub fn build_bindings(config: &Config) -> anyhow::Result<Vec<SourceBinding>> {
    let options = SourceOptions::default()
        .with_timeout(config.request_timeout)
        .with_min_delay(config.pacing);
    let mut bindings = Vec::new();

    if !config.stock_symbols.is_empty() || !config.crypto_quote_symbols.is_empty() {
        let quotes: Arc<dyn QuoteSource> = Arc::new(YahooQuoteProvider::new(options.clone())?);
        if !config.stock_symbols.is_empty() {
            bindings.push(SourceBinding::new(
                quotes.clone(),
                MarketSource::Stock,
                config.stock_symbols.iter().cloned(),
            ));
        }
        if !config.crypto_quote_symbols.is_empty() {
            bindings.push(SourceBinding::new(
                quotes,
                MarketSource::Crypto,
                config.crypto_quote_symbols.iter().cloned(),
            ));
        }
    }

    if !config.coingecko_ids.is_empty() {
        let coingecko = CoinGeckoProvider::new(
            options.clone(),
            &config.vs_currency,
            config.coingecko_api_key.clone(),
        )?;
        bindings.push(SourceBinding::new(
            Arc::new(coingecko),
            MarketSource::Crypto,
            config.coingecko_ids.iter().cloned(),
        ));
    }

    if !config.chart_symbols.is_empty() {
        bindings.push(SourceBinding::new(
            Arc::new(ChartScraperProvider::new(options)?),
            MarketSource::Stock,
            config.chart_symbols.iter().cloned(),
        ));
    }

    Ok(bindings)
}

/// Runs one cycle against the configured database. The database is closed
/// before returning whatever the cycle outcome.
pub async fn run_ingest(config: &Config, cancel: CancelSignal) -> anyhow::Result<CycleSummary> {
    config.ensure_universe()?;
    let deadline = config.deadline_from(Instant::now())?;
    let bindings = build_bindings(config)?;
    let ctx = CycleContext::new(NormalizeContext::now_in(config.market_tz))
        .with_deadline(deadline)
        .with_cancel(cancel);

    let db = PriceDatabase::open(&config.db_path)?;
    let summary = run_cycle(db.prices(), bindings, config.concurrent_sources, &ctx).await;
    db.close().await;
    Ok(summary)
}

async fn run_cycle(
    store: Arc<dyn PriceStore>,
    bindings: Vec<SourceBinding>,
    concurrent_sources: bool,
    ctx: &CycleContext,
) -> CycleSummary {
    IngestionOrchestrator::new(store, bindings)
        .with_concurrent_sources(concurrent_sources)
        .run_cycle(ctx)
        .await
}

/// Days back from today covered by the recent-rows section of `check`.
const RECENT_DAYS: i64 = 5;

pub struct QualityReport {
    pub db_path: String,
    pub summaries: Vec<SymbolSummary>,
    pub issues: Vec<StoredPrice>,
    /// First date of the recent window, in the market timezone.
    pub recent_since: NaiveDate,
    pub recent: Vec<StoredPrice>,
}

pub async fn run_check(config: &Config, limit: i64) -> anyhow::Result<QualityReport> {
    let today = NormalizeContext::now_in(config.market_tz).today;
    let recent_since = today - Duration::days(RECENT_DAYS);

    let db = PriceDatabase::open(&config.db_path)?;
    let store = db.prices();
    let report = store.symbol_summaries().and_then(|summaries| {
        Ok(QualityReport {
            db_path: config.db_path.clone(),
            summaries,
            issues: store.quality_issues(limit)?,
            recent_since,
            recent: store.prices_since(recent_since)?,
        })
    });
    db.close().await;
    Ok(report?)
}

pub fn print_summary(summary: &CycleSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("{}", summary.summary());
    for failure in &summary.failures {
        println!(
            "  FAILED {:<12} {:<12} [{}] {}",
            failure.symbol, failure.source_id, failure.kind, failure.message
        );
    }
    Ok(())
}

pub fn print_report(report: &QualityReport) {
    println!("Database: {}", report.db_path);
    if report.summaries.is_empty() {
        println!("No prices stored yet.");
        return;
    }

    println!(
        "{:<12} {:<7} {:>7} {:<10} {:<10} {:>10} {:>10}",
        "SYMBOL", "SOURCE", "ROWS", "EARLIEST", "LATEST", "NULL_CLOSE", "NO_VOLUME"
    );
    for s in &report.summaries {
        println!(
            "{:<12} {:<7} {:>7} {:<10} {:<10} {:>10} {:>10}",
            s.symbol,
            s.market_source.as_str(),
            s.record_count,
            display_date(s.earliest_date),
            display_date(s.latest_date),
            s.null_close_count,
            s.missing_volume_count
        );
    }

    println!("\nRows since {}:", report.recent_since);
    if report.recent.is_empty() {
        println!("  none");
    }
    for row in &report.recent {
        print_row(row);
    }

    if report.issues.is_empty() {
        println!("\nNo data quality issues found.");
        return;
    }
    println!("\nRecent data quality issues:");
    for row in &report.issues {
        print_row(row);
    }
}

fn print_row(row: &StoredPrice) {
    let close = row
        .close
        .map(|c| c.to_string())
        .unwrap_or_else(|| "NULL".to_string());
    let volume = row
        .volume
        .map(|v| v.to_string())
        .unwrap_or_else(|| "NULL".to_string());
    println!(
        "  {:<12} {} {:<7} close={} volume={}",
        row.symbol,
        row.price_date,
        row.market_source.as_str(),
        close,
        volume
    );
}

fn display_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}
