//! Per-symbol pipeline errors.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use pricesync_market_data::{MarketDataError, SourceErrorKind};

use crate::errors::{Error, NormalizationError};

/// Reporting category of a per-symbol failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network or timeout talking to a source.
    Transport,
    /// Non-success status or unparseable payload from a source.
    Protocol,
    /// Well-formed payload missing mandatory fields.
    Normalization,
    /// Store read failed.
    FreshnessQuery,
    /// Store write failed.
    Persistence,
    /// The cycle deadline passed before the symbol completed.
    Timeout,
    /// The cycle was cancelled before the symbol started.
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Normalization => "normalization",
            ErrorKind::FreshnessQuery => "freshness_query",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Why one symbol's pipeline stopped.
///
/// Never unwinds the cycle: the orchestrator records it and moves on.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("{0}")]
    Source(#[from] MarketDataError),

    #[error("{0}")]
    Normalization(#[from] NormalizationError),

    #[error("freshness query failed: {0}")]
    FreshnessQuery(#[source] Error),

    #[error("persistence failed: {0}")]
    Persistence(#[source] Error),

    #[error("no data returned for identifier {0}")]
    MissingFromBatch(String),

    #[error("cycle deadline passed before {0} completed")]
    DeadlineExceeded(String),

    #[error("cycle cancelled before {0} started")]
    Cancelled(String),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Source(e) => match e.kind() {
                SourceErrorKind::Transport => ErrorKind::Transport,
                SourceErrorKind::Protocol => ErrorKind::Protocol,
            },
            IngestError::Normalization(_) | IngestError::MissingFromBatch(_) => {
                ErrorKind::Normalization
            }
            IngestError::FreshnessQuery(_) => ErrorKind::FreshnessQuery,
            IngestError::Persistence(_) => ErrorKind::Persistence,
            IngestError::DeadlineExceeded(_) => ErrorKind::Timeout,
            IngestError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }
}
