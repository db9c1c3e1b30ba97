//! Ingestion cycle orchestration.
//!
//! - `orchestrator` - `IngestionOrchestrator::run_cycle`
//! - `model` - bindings, cycle context, per-symbol states and the summary
//! - `errors` - per-symbol `IngestError` and its reporting `ErrorKind`
//! - `cancel` - cancellation handle/signal pair

mod cancel;
mod errors;
mod model;
mod orchestrator;

#[cfg(test)]
mod orchestrator_tests;

pub use cancel::{cancel_channel, CancelHandle, CancelSignal};
pub use errors::{ErrorKind, IngestError};
pub use model::{
    CycleContext, CycleSummary, SourceBinding, SymbolFailure, SymbolOutcome, SymbolState,
};
pub use orchestrator::IngestionOrchestrator;
