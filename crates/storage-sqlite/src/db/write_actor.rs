use super::{DbConnection, DbPool};
use crate::errors::{IntoCore, StorageError};
use diesel::SqliteConnection;
use log::{debug, warn};
use pricesync_core::errors::{Error, Result};
use std::any::Any;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

// A job runs against the writer's connection inside an immediate transaction.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type ErasedJob = Job<Box<dyn Any + Send + 'static>>;
type ErasedReply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

const QUEUE_CAPACITY: usize = 1024;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(ErasedJob, ErasedReply)>,
}

impl WriteHandle {
    /// Executes a job on the writer actor's dedicated connection and waits
    /// for its result.
    ///
    /// Fails with a connection error once the writer has shut down.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| unavailable("writer is shut down"))?;

        let boxed = ret_rx
            .await
            .map_err(|_| unavailable("writer dropped the job without replying"))??;

        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Error::Unexpected("writer returned an unexpected result type".to_string()))
    }
}

/// Owns the writer task. Dropping it stops the writer the same way
/// [`WriterTask::shutdown`] does, without waiting for it to finish.
pub struct WriterTask {
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl WriterTask {
    /// Stops accepting jobs, finishes the ones already queued, and releases
    /// the writer's connection.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.join.await {
            warn!("Writer task ended abnormally: {}", e);
        }
    }
}

/// Spawns the single database writer. The task owns one pooled connection
/// for its lifetime and runs jobs serially, each in an immediate transaction.
pub fn spawn_writer(pool: &DbPool) -> Result<(WriteHandle, WriterTask)> {
    let conn = pool.get().into_core()?;
    let (tx, rx) = mpsc::channel::<(ErasedJob, ErasedReply)>(QUEUE_CAPACITY);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let join = tokio::spawn(run_writer(conn, rx, shutdown_rx));

    Ok((
        WriteHandle { tx },
        WriterTask {
            shutdown_tx: Some(shutdown_tx),
            join,
        },
    ))
}

async fn run_writer(
    mut conn: DbConnection,
    mut rx: mpsc::Receiver<(ErasedJob, ErasedReply)>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            next = rx.recv() => match next {
                Some((job, reply_tx)) => run_job(&mut conn, job, reply_tx),
                None => break,
            },
            _ = &mut shutdown_rx => {
                rx.close();
                while let Some((job, reply_tx)) = rx.recv().await {
                    run_job(&mut conn, job, reply_tx);
                }
                break;
            }
        }
    }
    debug!("Writer task stopped");
}

fn run_job(conn: &mut DbConnection, job: ErasedJob, reply_tx: ErasedReply) {
    let result: Result<Box<dyn Any + Send + 'static>> = conn
        .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
        .map_err(|e: StorageError| e.into());

    // The caller may have stopped waiting.
    let _ = reply_tx.send(result);
}

fn unavailable(message: &str) -> Error {
    StorageError::WriterUnavailable(message.to_string()).into()
}
