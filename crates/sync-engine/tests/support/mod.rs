// crates/sync-engine/tests/support/mod.rs
//! In-memory logging server for sync tests

#![allow(dead_code)]

use async_trait::async_trait;
use measvre_core::{KindRegistry, Measurement, MeasurementRecord, MeasurementRef, Point3};
use measvre_sync_engine::{
    notification_channel, LogApi, NotificationReceiver, PendingChanges, ProjectArchive,
    ProjectInfo, Session, SyncError, SyncOrchestrator, SyncResult,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A request received by the fake server
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateProject(String),
    DeleteProject(String),
    DownloadProject(String),
    AddMeasurements {
        key: String,
        records: Vec<MeasurementRecord>,
    },
    UpdateMeasurements {
        key: String,
        remove: Vec<i64>,
        replace: Vec<MeasurementRecord>,
    },
    AddSnapshots {
        key: String,
        measurement_id: i64,
        count: usize,
    },
    DeleteSnapshots {
        key: String,
        measurement_id: i64,
        file_names: Vec<String>,
    },
}

/// Records every call and answers like the logging server
///
/// Ids are handed out from 1 and file names as `snap{n}.png` from 0.
/// Individual operations can be scripted to fail.
#[derive(Debug, Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    last_id: AtomicI64,
    next_file: AtomicUsize,
    fail_create: AtomicBool,
    fail_add_measurements: AtomicBool,
    fail_update: AtomicBool,
    failing_snapshot_groups: Mutex<HashSet<i64>>,
    /// Replaces the ids of the next add-measurements response
    scripted_ids: Mutex<Option<Vec<i64>>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// The next assigned measurement id will be `id`
    pub fn set_next_id(&self, id: i64) {
        self.last_id.store(id - 1, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_add_measurements(&self, fail: bool) {
        self.fail_add_measurements.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    /// Snapshot requests for `measurement_id` fail
    pub fn fail_snapshots_for(&self, measurement_id: i64) {
        self.failing_snapshot_groups
            .lock()
            .unwrap()
            .insert(measurement_id);
    }

    pub fn script_ids(&self, ids: Vec<i64>) {
        *self.scripted_ids.lock().unwrap() = Some(ids);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn snapshots_fail(&self, measurement_id: i64) -> bool {
        self.failing_snapshot_groups
            .lock()
            .unwrap()
            .contains(&measurement_id)
    }
}

fn rejected(message: &str) -> SyncError {
    SyncError::Server {
        status: Some(500),
        message: message.to_string(),
    }
}

#[async_trait]
impl LogApi for FakeApi {
    async fn create_project(&self, name: &str) -> SyncResult<ProjectInfo> {
        self.record(Call::CreateProject(name.to_string()));
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(rejected("project name required"));
        }
        Ok(ProjectInfo {
            key: "abc123".to_string(),
            name: name.to_string(),
        })
    }

    async fn delete_project(&self, key: &str) -> SyncResult<()> {
        self.record(Call::DeleteProject(key.to_string()));
        Ok(())
    }

    async fn download_project(&self, key: &str) -> SyncResult<ProjectArchive> {
        self.record(Call::DownloadProject(key.to_string()));
        Ok(ProjectArchive {
            filename: Some("demo.zip".to_string()),
            bytes: b"PK\x03\x04".to_vec(),
        })
    }

    async fn add_measurements(&self, key: &str, measurements: &[MeasurementRecord]) -> SyncResult<Vec<i64>> {
        self.record(Call::AddMeasurements {
            key: key.to_string(),
            records: measurements.to_vec(),
        });
        if self.fail_add_measurements.load(Ordering::SeqCst) {
            return Err(rejected("measurements required"));
        }
        if let Some(ids) = self.scripted_ids.lock().unwrap().take() {
            return Ok(ids);
        }
        Ok(measurements
            .iter()
            .map(|_| self.last_id.fetch_add(1, Ordering::SeqCst) + 1)
            .collect())
    }

    async fn update_measurements(
        &self,
        key: &str,
        remove: &[i64],
        replace: &[MeasurementRecord],
    ) -> SyncResult<()> {
        self.record(Call::UpdateMeasurements {
            key: key.to_string(),
            remove: remove.to_vec(),
            replace: replace.to_vec(),
        });
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(rejected("update failed"));
        }
        Ok(())
    }

    async fn add_snapshots(&self, key: &str, measurement_id: i64, images: &[Vec<u8>]) -> SyncResult<Vec<String>> {
        self.record(Call::AddSnapshots {
            key: key.to_string(),
            measurement_id,
            count: images.len(),
        });
        if self.snapshots_fail(measurement_id) {
            return Err(rejected("snapshot upload failed"));
        }
        Ok(images
            .iter()
            .map(|_| format!("snap{}.png", self.next_file.fetch_add(1, Ordering::SeqCst)))
            .collect())
    }

    async fn delete_snapshots(&self, key: &str, measurement_id: i64, file_names: &[String]) -> SyncResult<()> {
        self.record(Call::DeleteSnapshots {
            key: key.to_string(),
            measurement_id,
            file_names: file_names.to_vec(),
        });
        if self.snapshots_fail(measurement_id) {
            return Err(rejected("snapshot delete failed"));
        }
        Ok(())
    }
}

/// A distance measurement between two markers
pub fn distance(a: [f64; 3], b: [f64; 3], value: f64) -> MeasurementRef {
    let kind = KindRegistry::with_builtins()
        .resolve("Distance")
        .unwrap()
        .clone();
    Measurement::new(kind, vec![Point3::from(a), Point3::from(b)], value).unwrap()
}

/// A measurement that already exists on the server
pub fn uploaded(id: i64) -> MeasurementRef {
    let m = distance([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 1.0);
    m.set_remote_id(id);
    m
}

/// An orchestrator bound to project `abc123`
pub fn orchestrator(api: Arc<FakeApi>) -> (SyncOrchestrator, PendingChanges, NotificationReceiver) {
    let session = Arc::new(Session::new("127.0.0.1", 5000, "demo").with_key("abc123"));
    let changes = PendingChanges::new();
    let (notifier, receiver) = notification_channel();
    let orchestrator = SyncOrchestrator::new(api, session, changes.clone(), notifier);
    (orchestrator, changes, receiver)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
