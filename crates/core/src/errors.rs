//! Core error types for the price ingestion pipeline.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the pipeline.
///
/// Database-specific errors are wrapped in string form to keep this type
/// database-agnostic.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Failed to parse stored value: {0}")]
    Parse(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated outside the expected upsert conflict.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// A well-formed payload that cannot become a price record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizationError {
    #[error("quote has no symbol")]
    MissingSymbol,

    #[error("quote for {0} has no close price")]
    MissingClose(String),

    #[error("quote for {symbol} has non-numeric close price {value}")]
    NonNumericClose { symbol: String, value: String },
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_wraps() {
        let err: Error = DatabaseError::QueryFailed("no such table: prices".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Database operation failed: Database query failed: no such table: prices"
        );
    }

    #[test]
    fn test_normalization_error_messages() {
        let err = NormalizationError::NonNumericClose {
            symbol: "AAPL".to_string(),
            value: "NaN".to_string(),
        };
        assert_eq!(err.to_string(), "quote for AAPL has non-numeric close price NaN");
        assert_eq!(
            NormalizationError::MissingClose("BTC".to_string()).to_string(),
            "quote for BTC has no close price"
        );
    }

    #[test]
    fn test_parse_errors_convert() {
        let err: Error = "not-a-date"
            .parse::<chrono::NaiveDate>()
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Parse(_)));

        let err: Error = "abc".parse::<rust_decimal::Decimal>().unwrap_err().into();
        assert!(matches!(err, Error::Parse(_)));
    }
}
