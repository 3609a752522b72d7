//! Measurement domain model

use crate::error::{CoreError, CoreResult};
use crate::types::{KindDescriptor, Point3, SnapshotRef};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Server id of a measurement that has not been uploaded yet
pub const UNASSIGNED_ID: i64 = -1;

/// Shared handle to a measurement
pub type MeasurementRef = Arc<Measurement>;

/// Local identity of a measurement, stable across edits and uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasurementId(Uuid);

impl MeasurementId {
    /// Creates a new random MeasurementId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MeasurementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MeasurementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct Geometry {
    value: f64,
    markers: Vec<Point3>,
}

/// A measurement taken from a set of markers
///
/// The server id starts unset and is assigned once the measurement has been
/// uploaded. Geometry may change over the measurement's lifetime when its
/// markers are moved. Snapshots are owned by the measurement.
#[derive(Debug)]
pub struct Measurement {
    local_id: MeasurementId,
    kind: KindDescriptor,
    remote_id: RwLock<Option<i64>>,
    geometry: RwLock<Geometry>,
    snapshots: Mutex<Vec<SnapshotRef>>,
}

impl Measurement {
    /// Creates a measurement with a value computed by the caller
    pub fn new(kind: KindDescriptor, markers: Vec<Point3>, value: f64) -> CoreResult<MeasurementRef> {
        kind.check_markers(markers.len())?;
        if !value.is_finite() {
            return Err(CoreError::InvalidValue(value));
        }

        Ok(Arc::new(Self {
            local_id: MeasurementId::new(),
            kind,
            remote_id: RwLock::new(None),
            geometry: RwLock::new(Geometry { value, markers }),
            snapshots: Mutex::new(Vec::new()),
        }))
    }

    /// Creates a measurement using the kind's built-in evaluator
    ///
    /// Fails with `InvalidValue(NaN)` for kinds without an evaluator.
    pub fn measure(kind: KindDescriptor, markers: Vec<Point3>, scale: f64) -> CoreResult<MeasurementRef> {
        kind.check_markers(markers.len())?;
        let value = kind.evaluate(&markers, scale).unwrap_or(f64::NAN);
        Self::new(kind, markers, value)
    }

    pub fn local_id(&self) -> MeasurementId {
        self.local_id
    }

    pub fn kind(&self) -> &KindDescriptor {
        &self.kind
    }

    /// Server id, or `None` if the measurement was never uploaded
    pub fn remote_id(&self) -> Option<i64> {
        *self.remote_id.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Records the id assigned by the server
    pub fn set_remote_id(&self, id: i64) {
        *self.remote_id.write().unwrap_or_else(|e| e.into_inner()) = Some(id);
    }

    /// Forgets the server id, e.g. when uploading to a new project
    pub fn clear_remote_id(&self) {
        *self.remote_id.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn value(&self) -> f64 {
        self.geometry().value
    }

    pub fn markers(&self) -> Vec<Point3> {
        self.geometry().markers.clone()
    }

    /// Returns true if one of the markers is at `marker`
    pub fn contains_marker(&self, marker: &Point3) -> bool {
        self.geometry().markers.iter().any(|m| m == marker)
    }

    /// Replaces markers and value after the markers were moved
    pub fn set_geometry(&self, markers: Vec<Point3>, value: f64) -> CoreResult<()> {
        self.kind.check_markers(markers.len())?;
        if !value.is_finite() {
            return Err(CoreError::InvalidValue(value));
        }
        let mut geometry = self.geometry_mut();
        geometry.markers = markers;
        geometry.value = value;
        Ok(())
    }

    /// Snapshots attached to this measurement, in capture order
    pub fn snapshots(&self) -> Vec<SnapshotRef> {
        self.snapshot_list().clone()
    }

    /// Attaches a snapshot, ignoring duplicates
    pub fn attach_snapshot(&self, snapshot: SnapshotRef) {
        let mut snapshots = self.snapshot_list();
        if !snapshots.iter().any(|s| Arc::ptr_eq(s, &snapshot)) {
            snapshots.push(snapshot);
        }
    }

    /// Detaches a snapshot, returning false if it was not attached
    pub fn detach_snapshot(&self, snapshot: &SnapshotRef) -> bool {
        let mut snapshots = self.snapshot_list();
        let before = snapshots.len();
        snapshots.retain(|s| !Arc::ptr_eq(s, snapshot));
        snapshots.len() != before
    }

    /// Wire representation of the measurement
    pub fn to_record(&self) -> MeasurementRecord {
        let geometry = self.geometry();
        MeasurementRecord {
            id: self.remote_id().unwrap_or(UNASSIGNED_ID),
            kind: self.kind.tag().to_string(),
            value: geometry.value,
            markers: geometry.markers.clone(),
        }
    }

    fn geometry(&self) -> RwLockReadGuard<'_, Geometry> {
        self.geometry.read().unwrap_or_else(|e| e.into_inner())
    }

    fn geometry_mut(&self) -> RwLockWriteGuard<'_, Geometry> {
        self.geometry.write().unwrap_or_else(|e| e.into_inner())
    }

    fn snapshot_list(&self) -> MutexGuard<'_, Vec<SnapshotRef>> {
        self.snapshots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PartialEq for Measurement {
    fn eq(&self, other: &Self) -> bool {
        self.local_id == other.local_id
    }
}

impl Eq for Measurement {}

/// Serialized form of a measurement
///
/// `id` is `-1` until the server has assigned one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    pub markers: Vec<Point3>,
}
