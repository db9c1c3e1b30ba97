//! SQLite storage for the price ingestion pipeline.
//!
//! This crate is the only place where Diesel dependencies exist. It
//! implements the `PriceStore` trait from `pricesync-core` and contains:
//! - Connection pooling, PRAGMA setup and the single writer actor
//! - Embedded Diesel migrations
//! - The price repository and its database models
//!
//! ```text
//! market-data (sources)
//!       │
//!       ▼
//! core (pipeline) ──PriceStore──▶ storage-sqlite (this crate) ──▶ SQLite DB
//! ```

pub mod database;
pub mod db;
pub mod errors;
pub mod prices;
pub mod schema;

pub use database::PriceDatabase;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle, WriterTask,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use prices::PriceRepository;

// Re-export from pricesync-core for convenience
pub use pricesync_core::errors::{DatabaseError, Error, Result};
