//! Cycle inputs and per-symbol outcomes.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;

use pricesync_market_data::QuoteSource;

use super::cancel::CancelSignal;
use super::errors::ErrorKind;
use crate::prices::{MarketSource, NormalizeContext, PriceRecord, UpsertOutcome};

/// A source together with the symbols it serves and their provenance.
#[derive(Clone)]
pub struct SourceBinding {
    pub source: Arc<dyn QuoteSource>,
    pub market_source: MarketSource,
    pub symbols: Vec<String>,
}

impl SourceBinding {
    pub fn new<I, S>(source: Arc<dyn QuoteSource>, market_source: MarketSource, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source,
            market_source,
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Debug for SourceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceBinding")
            .field("source", &self.source.id())
            .field("market_source", &self.market_source)
            .field("symbols", &self.symbols)
            .finish()
    }
}

/// Inputs that bound one cycle.
#[derive(Clone, Debug)]
pub struct CycleContext {
    pub dates: NormalizeContext,
    /// Symbols not finished fetching by this instant fail with a timeout.
    pub deadline: Option<Instant>,
    pub cancel: CancelSignal,
}

impl CycleContext {
    pub fn new(dates: NormalizeContext) -> Self {
        Self {
            dates,
            deadline: None,
            cancel: CancelSignal::never(),
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Pipeline position of one symbol.
///
/// `Pending -> Fetched -> Normalized -> FreshnessChecked -> {Upserted | SkippedFresh}`;
/// any stage may go straight to `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "detail")]
pub enum SymbolState {
    Pending,
    Fetched,
    Normalized,
    FreshnessChecked,
    Upserted(UpsertOutcome),
    SkippedFresh,
    Failed(ErrorKind),
}

impl SymbolState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SymbolState::Upserted(_) | SymbolState::SkippedFresh | SymbolState::Failed(_)
        )
    }
}

impl fmt::Display for SymbolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolState::Pending => write!(f, "pending"),
            SymbolState::Fetched => write!(f, "fetched"),
            SymbolState::Normalized => write!(f, "normalized"),
            SymbolState::FreshnessChecked => write!(f, "freshness_checked"),
            SymbolState::Upserted(outcome) => write!(f, "upserted ({})", outcome),
            SymbolState::SkippedFresh => write!(f, "skipped_fresh"),
            SymbolState::Failed(kind) => write!(f, "failed ({})", kind),
        }
    }
}

/// Final state of one symbol in a cycle.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolOutcome {
    /// Symbol or identifier as configured.
    pub symbol: String,
    pub source_id: String,
    pub market_source: MarketSource,
    pub state: SymbolState,
    /// The normalized record, when the pipeline got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<PriceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A failed symbol as reported in the cycle summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFailure {
    pub symbol: String,
    pub source_id: String,
    pub market_source: MarketSource,
    pub kind: ErrorKind,
    pub message: String,
}

/// Aggregate result of one ingestion cycle.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped_fresh: usize,
    pub failed: usize,
    pub failures: Vec<SymbolFailure>,
    /// Every symbol's outcome in configuration order.
    pub outcomes: Vec<SymbolOutcome>,
}

impl CycleSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.skipped_fresh + self.failed
    }

    /// No symbol failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// At least one symbol was attempted and every one of them failed.
    pub fn all_failed(&self) -> bool {
        self.failed > 0 && self.failed == self.total()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} symbols: {} inserted, {} updated, {} skipped (fresh), {} failed",
            self.total(),
            self.inserted,
            self.updated,
            self.skipped_fresh,
            self.failed
        )
    }

    pub(crate) fn add_outcome(&mut self, outcome: SymbolOutcome) {
        match outcome.state {
            SymbolState::Upserted(UpsertOutcome::Inserted) => self.inserted += 1,
            SymbolState::Upserted(UpsertOutcome::Updated) => self.updated += 1,
            SymbolState::SkippedFresh => self.skipped_fresh += 1,
            SymbolState::Failed(kind) => {
                self.failed += 1;
                self.failures.push(SymbolFailure {
                    symbol: outcome.symbol.clone(),
                    source_id: outcome.source_id.clone(),
                    market_source: outcome.market_source,
                    kind,
                    message: outcome.error.clone().unwrap_or_default(),
                });
            }
            // Non-terminal states never reach the summary.
            SymbolState::Pending
            | SymbolState::Fetched
            | SymbolState::Normalized
            | SymbolState::FreshnessChecked => {}
        }
        self.outcomes.push(outcome);
    }
}
