// crates/sync-engine/src/service.rs
//! The logging service
//!
//! `LogService` wires a session, the live change set, the inventory, the
//! orchestrator and the worker together. Every remote operation runs on
//! the worker, so flushes and project calls execute one at a time in the
//! order they were requested. Callers never block on the network: each
//! call returns a completion handle.

use crate::api::{HttpLogApi, LogApi};
use crate::changes::PendingChanges;
use crate::error::SyncResult;
use crate::inventory::Inventory;
use crate::notifications::{self, NotificationReceiver};
use crate::orchestrator::SyncOrchestrator;
use crate::session::Session;
use crate::types::{ChangeType, ProjectInfo, UploadReport};
use crate::worker::{PendingResult, SyncWorker};
use measvre_core::{MeasurementRef, SnapshotRef};
use measvre_network::{Client, ClientConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Completion handle of a flush
pub type PendingUpload = PendingResult<UploadReport>;

/// Explicitly constructed sync service
pub struct LogService {
    session: Arc<Session>,
    changes: PendingChanges,
    inventory: Arc<Inventory>,
    orchestrator: SyncOrchestrator,
    worker: Arc<SyncWorker>,
}

impl LogService {
    /// Starts the service over any `LogApi` implementation
    pub fn start(session: Arc<Session>, api: Arc<dyn LogApi>) -> SyncResult<(Self, NotificationReceiver)> {
        let (notifier, receiver) = notifications::channel();
        let changes = PendingChanges::new();
        let inventory = Arc::new(Inventory::new(changes.clone()));
        let orchestrator = SyncOrchestrator::new(api, Arc::clone(&session), changes.clone(), notifier);
        let worker = Arc::new(SyncWorker::start()?);

        let service = Self {
            session,
            changes,
            inventory,
            orchestrator,
            worker,
        };
        Ok((service, receiver))
    }

    /// Starts the service against the HTTP logging server
    pub fn connect(session: Session, config: ClientConfig) -> SyncResult<(Self, NotificationReceiver)> {
        let session = Arc::new(session);
        let client = Client::with_config(config)?;
        let api = Arc::new(HttpLogApi::new(client, Arc::clone(&session)));
        Self::start(session, api)
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn inventory(&self) -> &Arc<Inventory> {
        &self.inventory
    }

    /// The live change set
    pub fn pending_changes(&self) -> &PendingChanges {
        &self.changes
    }

    /// Registers a measurement edit made outside the inventory
    pub fn register_measurement(&self, change: ChangeType, measurement: &MeasurementRef) -> SyncResult<()> {
        self.changes.register_measurement(change, measurement)
    }

    /// Registers a snapshot edit made outside the inventory
    pub fn register_snapshot(&self, change: ChangeType, snapshot: &SnapshotRef) -> SyncResult<()> {
        self.changes.register_snapshot(change, snapshot)
    }

    /// Queues an upload of everything pending
    ///
    /// The live change set is swapped out when the worker reaches this
    /// flush, so edits made while earlier flushes are in flight are
    /// included.
    pub fn flush(&self) -> SyncResult<PendingUpload> {
        flush_on(&self.worker, &self.orchestrator)
    }

    /// Queues project creation
    ///
    /// On success the whole inventory is queued for upload to the new
    /// project; call `flush` to send it.
    pub fn create_project(&self, name: impl Into<String>) -> SyncResult<PendingResult<ProjectInfo>> {
        let name = name.into();
        let orchestrator = self.orchestrator.clone();
        let inventory = Arc::clone(&self.inventory);
        self.worker
            .submit(async move { orchestrator.create_project(&name, &inventory).await })
    }

    /// Queues deletion of the current project
    pub fn delete_project(&self) -> SyncResult<PendingResult<()>> {
        let orchestrator = self.orchestrator.clone();
        self.worker
            .submit(async move { orchestrator.delete_project().await })
    }

    /// Queues a download of the current project into `dest_dir`
    pub fn download_project(&self, dest_dir: impl Into<PathBuf>) -> SyncResult<PendingResult<PathBuf>> {
        let dest_dir = dest_dir.into();
        let orchestrator = self.orchestrator.clone();
        self.worker
            .submit(async move { orchestrator.download_project(&dest_dir).await })
    }

    /// Flushes every `period` while the returned guard is alive
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_auto_flush(&self, period: Duration) -> AutoFlush {
        let worker = Arc::clone(&self.worker);
        let orchestrator = self.orchestrator.clone();
        let changes = self.changes.clone();

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                ticker.tick().await;
                if changes.pending_count() == 0 {
                    continue;
                }
                if let Err(e) = flush_on(&worker, &orchestrator) {
                    log::debug!("Stopping periodic flush: {}", e);
                    break;
                }
            }
        });

        log::info!("Flushing every {:?}", period);
        AutoFlush { task }
    }

    /// Stops the worker after draining queued operations
    pub fn shutdown(&self) -> SyncResult<()> {
        self.worker.shutdown()
    }
}

fn flush_on(worker: &SyncWorker, orchestrator: &SyncOrchestrator) -> SyncResult<PendingUpload> {
    let orchestrator = orchestrator.clone();
    worker.submit(async move { orchestrator.flush().await })
}

/// Guard for a periodic flush task; dropping it stops the task
#[derive(Debug)]
pub struct AutoFlush {
    task: JoinHandle<()>,
}

impl AutoFlush {
    pub fn stop(self) {}
}

impl Drop for AutoFlush {
    fn drop(&mut self) {
        self.task.abort();
    }
}
