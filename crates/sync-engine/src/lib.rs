// crates/sync-engine/src/lib.rs
//! Measurement synchronization engine
//!
//! Keeps the local measurement inventory consistent with the remote
//! logging server while the user keeps editing:
//! - Change tracking with coalescing (`ChangeSet`, `PendingChanges`)
//! - Ordered upload protocol with failure re-queuing (`SyncOrchestrator`)
//! - A single background worker that runs remote operations in order
//! - Status notifications for the user interface
//!
//! # Example
//!
//! ```rust
//! use measvre_core::{KindRegistry, Measurement, Point3};
//! use measvre_sync_engine::{ChangeSet, ChangeType};
//!
//! let kind = KindRegistry::with_builtins().resolve("Distance").unwrap().clone();
//! let m = Measurement::measure(
//!     kind,
//!     vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
//!     1.0,
//! )
//! .unwrap();
//!
//! let mut changes = ChangeSet::new();
//! changes.register_measurement(ChangeType::Added, &m);
//! changes.register_measurement(ChangeType::Deleted, &m);
//!
//! // The server never saw it, so there is nothing to send
//! assert!(changes.is_empty());
//! ```

mod api;
mod changes;
mod error;
mod inventory;
mod notifications;
mod orchestrator;
mod protocol;
mod service;
mod session;
mod types;
mod worker;

pub use api::{HttpLogApi, LogApi};
pub use changes::{ChangeSet, PendingChanges};
pub use error::{SyncError, SyncResult};
pub use inventory::Inventory;
pub use notifications::{channel as notification_channel, NotificationReceiver, Notifier};
pub use orchestrator::{
    SyncOrchestrator, STATUS_NO_PROJECT, STATUS_PROJECT_CREATED, STATUS_PROJECT_FAILED,
    STATUS_UPLOADED, STATUS_UPLOAD_FAILED,
};
pub use protocol::{
    snapshot_form, AddMeasurementsRequest, CreateProjectRequest, DeleteSnapshotsRequest,
    ResponseMessage, UpdateMeasurementsRequest,
};
pub use service::{AutoFlush, LogService, PendingUpload};
pub use session::{Session, DEFAULT_BASE_PATH};
pub use types::{ChangeType, ProjectArchive, ProjectInfo, UploadReport};
pub use worker::{Job, PendingResult, SyncWorker};
