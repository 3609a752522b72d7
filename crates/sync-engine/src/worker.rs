// crates/sync-engine/src/worker.rs
//! Single background executor for sync operations
//!
//! Jobs run one at a time in submission order on a dedicated thread with
//! its own current-thread tokio runtime. A job may fan out internally; the
//! next job starts only after it completes. On shutdown, jobs already
//! queued are drained before the thread exits.

use crate::error::{SyncError, SyncResult};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Mutex;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

/// A queued unit of work
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

enum Command {
    Run(Job),
    Shutdown,
}

/// Completion handle for a submitted job
///
/// Dropping it does not cancel the job. Waiting fails with
/// `WorkerStopped` if the job never ran to completion.
#[derive(Debug)]
pub struct PendingResult<T> {
    rx: oneshot::Receiver<SyncResult<T>>,
}

impl<T> PendingResult<T> {
    /// Waits for the job's result
    pub async fn wait(self) -> SyncResult<T> {
        self.rx.await.unwrap_or(Err(SyncError::WorkerStopped))
    }

    /// Blocks the calling thread until the job finishes
    ///
    /// Must not be called from within an async runtime.
    pub fn wait_blocking(self) -> SyncResult<T> {
        self.rx.blocking_recv().unwrap_or(Err(SyncError::WorkerStopped))
    }
}

/// FIFO executor running on its own thread
pub struct SyncWorker {
    tx: mpsc::UnboundedSender<Command>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyncWorker {
    /// Spawns the worker thread
    pub fn start() -> SyncResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = std::thread::Builder::new()
            .name("measvre-sync".to_string())
            .spawn(move || runtime.block_on(run(rx)))?;

        log::debug!("Sync worker started");
        Ok(Self {
            tx,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Queues a job without a completion handle
    pub fn enqueue<F>(&self, job: F) -> SyncResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tx
            .send(Command::Run(Box::pin(job)))
            .map_err(|_| SyncError::WorkerStopped)
    }

    /// Queues a job and returns a handle to its result
    pub fn submit<F, T>(&self, job: F) -> SyncResult<PendingResult<T>>
    where
        F: Future<Output = SyncResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.enqueue(async move {
            let _ = tx.send(job.await);
        })?;
        Ok(PendingResult { rx })
    }

    /// Returns true until `shutdown` has been called
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
            && self
                .handle
                .lock()
                .map(|h| h.is_some())
                .unwrap_or(false)
    }

    /// Stops accepting jobs, drains the queue and joins the thread
    ///
    /// In-flight requests are not cancelled. Calling this from a job
    /// running on the worker itself only signals the stop.
    pub fn shutdown(&self) -> SyncResult<()> {
        let handle = self
            .handle
            .lock()
            .map_err(|_| SyncError::LockPoisoned)?
            .take();
        let Some(handle) = handle else {
            return Ok(());
        };

        // Fails only if the thread is already gone
        let _ = self.tx.send(Command::Shutdown);

        if handle.thread().id() == std::thread::current().id() {
            return Ok(());
        }
        if handle.join().is_err() {
            log::error!("Sync worker thread panicked");
        }
        log::debug!("Sync worker stopped");
        Ok(())
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("Failed to stop sync worker: {}", e);
        }
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Run(job) => execute(job).await,
            Command::Shutdown => {
                rx.close();
                while let Some(command) = rx.recv().await {
                    if let Command::Run(job) = command {
                        execute(job).await;
                    }
                }
                break;
            }
        }
    }
}

async fn execute(job: Job) {
    if AssertUnwindSafe(job).catch_unwind().await.is_err() {
        log::error!("Sync job panicked; continuing with the next one");
    }
}
