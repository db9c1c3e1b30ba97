//! Lifecycle of the price database for one ingestion run.

use log::info;
use std::sync::Arc;

use crate::db::{create_pool, init, run_migrations, spawn_writer, WriterTask};
use crate::prices::PriceRepository;
use pricesync_core::Result;

/// An opened, migrated price database with its single writer running.
///
/// Close it with [`PriceDatabase::close`] so queued writes finish before the
/// connections are released.
pub struct PriceDatabase {
    path: String,
    writer_task: WriterTask,
    repository: Arc<PriceRepository>,
}

impl PriceDatabase {
    /// Opens (creating if needed) the database at `path` and applies pending
    /// migrations. Must be called from within a Tokio runtime.
    pub fn open(path: &str) -> Result<Self> {
        init(path)?;
        let pool = create_pool(path)?;
        run_migrations(&pool)?;
        let (writer, writer_task) = spawn_writer(&pool)?;
        let repository = Arc::new(PriceRepository::new(pool, writer));

        info!("Opened price database at {}", path);
        Ok(Self {
            path: path.to_string(),
            writer_task,
            repository,
        })
    }

    pub fn prices(&self) -> Arc<PriceRepository> {
        self.repository.clone()
    }

    /// Drains queued writes and stops the writer.
    /// Later writes through a retained repository fail with a connection error.
    pub async fn close(self) {
        self.writer_task.shutdown().await;
        info!("Closed price database at {}", self.path);
    }
}
