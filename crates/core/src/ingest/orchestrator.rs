//! Run orchestrator: one bounded ingestion cycle over every configured symbol.
//!
//! Each symbol runs fetch → normalize → freshness check → upsert. A failure
//! at any stage ends that symbol only; the cycle always reaches every
//! remaining symbol. There is no retry inside a cycle.
//!
//! Bindings may run concurrently; symbols inside a binding are always
//! processed in order, since their source paces requests sequentially.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};

use pricesync_market_data::{MarketDataError, RawQuote};

use super::errors::IngestError;
use super::model::{CycleContext, CycleSummary, SourceBinding, SymbolOutcome, SymbolState};
use crate::prices::{normalize, FreshnessGate, PriceRecord, PriceStore, Reconciler};

/// Drives ingestion cycles for a fixed set of source bindings.
pub struct IngestionOrchestrator {
    bindings: Vec<SourceBinding>,
    gate: FreshnessGate,
    reconciler: Reconciler,
    concurrent_sources: bool,
}

/// Tracks one symbol through the pipeline and builds its outcome.
struct SymbolRun<'a> {
    symbol: &'a str,
    binding: &'a SourceBinding,
    state: SymbolState,
    record: Option<PriceRecord>,
}

impl<'a> SymbolRun<'a> {
    fn new(symbol: &'a str, binding: &'a SourceBinding) -> Self {
        Self {
            symbol,
            binding,
            state: SymbolState::Pending,
            record: None,
        }
    }

    fn advance(&mut self, next: SymbolState) {
        debug!(
            "{} {}: {} -> {}",
            self.binding.source.id(),
            self.symbol,
            self.state,
            next
        );
        self.state = next;
    }

    fn finish(mut self, terminal: SymbolState) -> SymbolOutcome {
        self.advance(terminal);
        info!(
            "{} {} ({}): {}",
            self.binding.source.id(),
            self.symbol,
            self.binding.market_source,
            self.state
        );
        self.into_outcome(None)
    }

    fn fail(mut self, error: IngestError) -> SymbolOutcome {
        let kind = error.kind();
        warn!(
            "{} {} ({}) failed at {}: [{}] {}",
            self.binding.source.id(),
            self.symbol,
            self.binding.market_source,
            self.state,
            kind,
            error
        );
        self.advance(SymbolState::Failed(kind));
        self.into_outcome(Some(error.to_string()))
    }

    fn into_outcome(self, error: Option<String>) -> SymbolOutcome {
        SymbolOutcome {
            symbol: self.symbol.to_string(),
            source_id: self.binding.source.id().to_string(),
            market_source: self.binding.market_source,
            state: self.state,
            record: self.record,
            error,
        }
    }
}

/// Run `fut` unless the cycle is cancelled or its deadline passes first.
///
/// Only wraps external requests; store writes are never raced against
/// either signal, so a started upsert always completes.
async fn guarded<T>(
    ctx: &CycleContext,
    label: &str,
    fut: impl Future<Output = T>,
) -> Result<T, IngestError> {
    let cancelled = ctx.cancel.cancelled();
    match ctx.deadline {
        Some(deadline) => tokio::select! {
            biased;
            _ = cancelled => Err(IngestError::Cancelled(label.to_string())),
            result = tokio::time::timeout_at(deadline, fut) => {
                result.map_err(|_| IngestError::DeadlineExceeded(label.to_string()))
            }
        },
        None => tokio::select! {
            biased;
            _ = cancelled => Err(IngestError::Cancelled(label.to_string())),
            value = fut => Ok(value),
        },
    }
}

/// Check the cycle bounds before starting work on `label`.
fn precheck(ctx: &CycleContext, label: &str) -> Result<(), IngestError> {
    if ctx.cancel.is_cancelled() {
        return Err(IngestError::Cancelled(label.to_string()));
    }
    if ctx.deadline_passed() {
        return Err(IngestError::DeadlineExceeded(label.to_string()));
    }
    Ok(())
}

/// Trimmed, non-empty, first occurrence wins.
fn unique_symbols(binding: &SourceBinding) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut symbols = Vec::with_capacity(binding.symbols.len());
    for symbol in &binding.symbols {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            continue;
        }
        if seen.insert(symbol.to_string()) {
            symbols.push(symbol.to_string());
        } else {
            warn!(
                "{}: ignoring duplicate symbol {}",
                binding.source.id(),
                symbol
            );
        }
    }
    symbols
}

impl IngestionOrchestrator {
    pub fn new(store: Arc<dyn PriceStore>, bindings: Vec<SourceBinding>) -> Self {
        Self {
            bindings,
            gate: FreshnessGate::new(store.clone()),
            reconciler: Reconciler::new(store),
            concurrent_sources: true,
        }
    }

    /// Run bindings one after another instead of concurrently.
    pub fn with_concurrent_sources(mut self, concurrent: bool) -> Self {
        self.concurrent_sources = concurrent;
        self
    }

    pub fn bindings(&self) -> &[SourceBinding] {
        &self.bindings
    }

    /// Run one cycle and report every symbol's outcome.
    ///
    /// Never fails as a whole: per-symbol errors land in the summary.
    pub async fn run_cycle(&self, ctx: &CycleContext) -> CycleSummary {
        let symbol_count: usize = self.bindings.iter().map(|b| b.symbols.len()).sum();
        info!(
            "Starting ingestion cycle: {} symbols across {} sources (date {}, tz {})",
            symbol_count,
            self.bindings.len(),
            ctx.dates.today,
            ctx.dates.timezone
        );

        let per_binding: Vec<Vec<SymbolOutcome>> = if self.concurrent_sources {
            join_all(self.bindings.iter().map(|b| self.run_binding(b, ctx))).await
        } else {
            let mut results = Vec::with_capacity(self.bindings.len());
            for binding in &self.bindings {
                results.push(self.run_binding(binding, ctx).await);
            }
            results
        };

        let mut summary = CycleSummary::default();
        for outcome in per_binding.into_iter().flatten() {
            summary.add_outcome(outcome);
        }

        info!("Ingestion cycle finished: {}", summary.summary());
        summary
    }

    async fn run_binding(&self, binding: &SourceBinding, ctx: &CycleContext) -> Vec<SymbolOutcome> {
        let symbols = unique_symbols(binding);
        if symbols.is_empty() {
            return Vec::new();
        }

        if binding.source.supports_batch() {
            self.run_batch(binding, &symbols, ctx).await
        } else {
            let mut outcomes = Vec::with_capacity(symbols.len());
            for symbol in &symbols {
                outcomes.push(self.run_symbol(binding, symbol, ctx).await);
            }
            outcomes
        }
    }

    async fn run_symbol(
        &self,
        binding: &SourceBinding,
        symbol: &str,
        ctx: &CycleContext,
    ) -> SymbolOutcome {
        let run = SymbolRun::new(symbol, binding);

        if let Err(e) = precheck(ctx, symbol) {
            return run.fail(e);
        }

        match guarded(ctx, symbol, binding.source.fetch(symbol)).await {
            Ok(Ok(raw)) => self.process_fetched(run, raw, ctx).await,
            Ok(Err(e)) => run.fail(IngestError::Source(e)),
            Err(e) => run.fail(e),
        }
    }

    /// One request for the whole binding, then a per-identifier pipeline.
    async fn run_batch(
        &self,
        binding: &SourceBinding,
        symbols: &[String],
        ctx: &CycleContext,
    ) -> Vec<SymbolOutcome> {
        let label = format!("{} batch", binding.source.id());

        let fetched: Result<Result<HashMap<String, RawQuote>, MarketDataError>, IngestError> =
            match precheck(ctx, &label) {
                Ok(()) => guarded(ctx, &label, binding.source.fetch_batch(symbols)).await,
                Err(e) => Err(e),
            };

        let mut quotes = match fetched {
            Ok(Ok(quotes)) => quotes,
            Ok(Err(e)) => {
                return symbols
                    .iter()
                    .map(|s| SymbolRun::new(s, binding).fail(IngestError::Source(e.clone())))
                    .collect();
            }
            Err(e) => {
                let kind_error = |s: &str| match &e {
                    IngestError::Cancelled(_) => IngestError::Cancelled(s.to_string()),
                    _ => IngestError::DeadlineExceeded(s.to_string()),
                };
                return symbols
                    .iter()
                    .map(|s| SymbolRun::new(s, binding).fail(kind_error(s)))
                    .collect();
            }
        };

        debug!(
            "{} batch returned {} of {} identifiers",
            binding.source.id(),
            quotes.len(),
            symbols.len()
        );

        let mut outcomes = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let run = SymbolRun::new(symbol, binding);
            let outcome = match quotes.remove(symbol) {
                Some(raw) => self.process_fetched(run, raw, ctx).await,
                None => run.fail(IngestError::MissingFromBatch(symbol.clone())),
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Normalize, check freshness and upsert a fetched quote.
    async fn process_fetched(
        &self,
        mut run: SymbolRun<'_>,
        raw: RawQuote,
        ctx: &CycleContext,
    ) -> SymbolOutcome {
        run.advance(SymbolState::Fetched);

        let record = match normalize(&raw, run.binding.market_source, &ctx.dates) {
            Ok(record) => record,
            Err(e) => return run.fail(IngestError::Normalization(e)),
        };
        run.record = Some(record.clone());
        run.advance(SymbolState::Normalized);

        let stale = match self.gate.is_stale(&record.symbol, record.price_date) {
            Ok(stale) => stale,
            Err(e) => return run.fail(IngestError::FreshnessQuery(e)),
        };
        run.advance(SymbolState::FreshnessChecked);

        if !stale {
            return run.finish(SymbolState::SkippedFresh);
        }

        match self.reconciler.upsert(&record).await {
            Ok(outcome) => run.finish(SymbolState::Upserted(outcome)),
            Err(e) => run.fail(IngestError::Persistence(e)),
        }
    }
}
