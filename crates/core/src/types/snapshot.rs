//! Snapshot domain model

use crate::types::{Measurement, MeasurementId, MeasurementRef};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, Weak};
use uuid::Uuid;

/// Shared handle to a snapshot
pub type SnapshotRef = Arc<Snapshot>;

/// Local identity of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(Uuid);

impl SnapshotId {
    /// Creates a new random SnapshotId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

/// An encoded image attached to a measurement
///
/// The snapshot refers back to its measurement without owning it. The
/// server identity is the file name returned by the upload.
#[derive(Debug)]
pub struct Snapshot {
    local_id: SnapshotId,
    owner_id: MeasurementId,
    measurement: Weak<Measurement>,
    encoded: Vec<u8>,
    file_name: RwLock<Option<String>>,
}

impl Snapshot {
    /// Creates a snapshot for `measurement` from PNG-encoded bytes
    ///
    /// The snapshot is not attached; callers decide when to attach it.
    pub fn new(measurement: &MeasurementRef, encoded: Vec<u8>) -> SnapshotRef {
        Arc::new(Self {
            local_id: SnapshotId::new(),
            owner_id: measurement.local_id(),
            measurement: Arc::downgrade(measurement),
            encoded,
            file_name: RwLock::new(None),
        })
    }

    pub fn local_id(&self) -> SnapshotId {
        self.local_id
    }

    /// The owning measurement, if it is still alive
    pub fn measurement(&self) -> Option<MeasurementRef> {
        self.measurement.upgrade()
    }

    /// Returns true if this snapshot was captured for `measurement`
    pub fn belongs_to(&self, measurement: &Measurement) -> bool {
        self.owner_id == measurement.local_id()
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Server file name, or `None` if never uploaded
    pub fn file_name(&self) -> Option<String> {
        self.file_name.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Records the file name assigned by the server
    pub fn set_file_name(&self, name: impl Into<String>) {
        *self.file_name.write().unwrap_or_else(|e| e.into_inner()) = Some(name.into());
    }

    pub fn clear_file_name(&self) {
        *self.file_name.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.local_id == other.local_id
    }
}

impl Eq for Snapshot {}
