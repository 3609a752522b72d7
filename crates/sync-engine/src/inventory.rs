// crates/sync-engine/src/inventory.rs
//! The local measurement inventory
//!
//! Owns every measurement the user has taken and records each edit in the
//! live change set. Edits hold the inventory lock while registering, so a
//! project reseed (which reads the inventory and replaces the change set
//! under the same lock) cannot lose an edit.

use crate::changes::{ChangeSet, PendingChanges};
use crate::error::{SyncError, SyncResult};
use crate::types::ChangeType;
use measvre_core::{MeasurementRef, Point3, Snapshot, SnapshotRef};
use std::sync::{Arc, Mutex, MutexGuard};

/// Measurements owned by the user, in creation order
#[derive(Debug)]
pub struct Inventory {
    measurements: Mutex<Vec<MeasurementRef>>,
    changes: PendingChanges,
}

impl Inventory {
    /// Creates an empty inventory recording edits into `changes`
    pub fn new(changes: PendingChanges) -> Self {
        Self {
            measurements: Mutex::new(Vec::new()),
            changes,
        }
    }

    fn lock(&self) -> SyncResult<MutexGuard<'_, Vec<MeasurementRef>>> {
        self.measurements.lock().map_err(|_| SyncError::LockPoisoned)
    }

    /// Adds a measurement; returns false if it was already present
    pub fn add(&self, measurement: &MeasurementRef) -> SyncResult<bool> {
        let mut measurements = self.lock()?;
        if measurements.iter().any(|m| Arc::ptr_eq(m, measurement)) {
            return Ok(false);
        }
        measurements.push(Arc::clone(measurement));
        self.changes.register_measurement(ChangeType::Added, measurement)?;
        Ok(true)
    }

    /// Removes a measurement and, with it, its snapshots
    pub fn remove(&self, measurement: &MeasurementRef) -> SyncResult<bool> {
        let mut measurements = self.lock()?;
        let before = measurements.len();
        measurements.retain(|m| !Arc::ptr_eq(m, measurement));
        if measurements.len() == before {
            return Ok(false);
        }
        self.changes.register_measurement(ChangeType::Deleted, measurement)?;
        Ok(true)
    }

    /// Replaces the markers and value of a measurement
    pub fn update_markers(&self, measurement: &MeasurementRef, markers: Vec<Point3>, value: f64) -> SyncResult<()> {
        let measurements = self.lock()?;
        ensure_present(&measurements, measurement)?;
        measurement.set_geometry(markers, value)?;
        self.changes.register_measurement(ChangeType::Modified, measurement)
    }

    /// Removes every measurement that uses `marker`
    ///
    /// Called when the user deletes a marker; returns the removed
    /// measurements.
    pub fn remove_measurements_of_marker(&self, marker: &Point3) -> SyncResult<Vec<MeasurementRef>> {
        let mut measurements = self.lock()?;
        let (removed, kept): (Vec<_>, Vec<_>) = measurements
            .drain(..)
            .partition(|m| m.contains_marker(marker));
        *measurements = kept;

        for m in &removed {
            self.changes.register_measurement(ChangeType::Deleted, m)?;
        }
        Ok(removed)
    }

    /// Moves a marker in every measurement that uses it
    ///
    /// Values are recomputed for kinds with a built-in evaluator; other
    /// kinds keep their value until `update_markers` supplies a new one.
    pub fn update_measurements_of_marker(
        &self,
        from: &Point3,
        to: Point3,
        scale: f64,
    ) -> SyncResult<Vec<MeasurementRef>> {
        let measurements = self.lock()?;
        let affected: Vec<MeasurementRef> = measurements
            .iter()
            .filter(|m| m.contains_marker(from))
            .cloned()
            .collect();

        for m in &affected {
            let markers: Vec<Point3> = m
                .markers()
                .into_iter()
                .map(|p| if p == *from { to } else { p })
                .collect();
            let value = m.kind().evaluate(&markers, scale).unwrap_or_else(|| m.value());
            m.set_geometry(markers, value)?;
            self.changes.register_measurement(ChangeType::Modified, m)?;
        }
        Ok(affected)
    }

    /// Captures a PNG snapshot for a measurement
    pub fn add_snapshot(&self, measurement: &MeasurementRef, png: Vec<u8>) -> SyncResult<SnapshotRef> {
        let measurements = self.lock()?;
        ensure_present(&measurements, measurement)?;

        let snapshot = Snapshot::new(measurement, png);
        measurement.attach_snapshot(Arc::clone(&snapshot));
        self.changes.register_snapshot(ChangeType::Added, &snapshot)?;
        Ok(snapshot)
    }

    /// Deletes a snapshot; returns false if it was not attached
    pub fn remove_snapshot(&self, snapshot: &SnapshotRef) -> SyncResult<bool> {
        let _measurements = self.lock()?;
        let Some(owner) = snapshot.measurement() else {
            return Ok(false);
        };
        if !owner.detach_snapshot(snapshot) {
            return Ok(false);
        }
        self.changes.register_snapshot(ChangeType::Deleted, snapshot)?;
        Ok(true)
    }

    /// Current measurements, in creation order
    pub fn measurements(&self) -> SyncResult<Vec<MeasurementRef>> {
        Ok(self.lock()?.clone())
    }

    /// Every snapshot of every measurement
    pub fn all_snapshots(&self) -> SyncResult<Vec<SnapshotRef>> {
        Ok(self.lock()?.iter().flat_map(|m| m.snapshots()).collect())
    }

    pub fn contains(&self, measurement: &MeasurementRef) -> bool {
        self.lock()
            .map(|ms| ms.iter().any(|m| Arc::ptr_eq(m, measurement)))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|ms| ms.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the live change set with the whole inventory marked new
    ///
    /// Server identities from any previous project are forgotten.
    pub(crate) fn reseed_changes(&self) -> SyncResult<usize> {
        let measurements = self.lock()?;
        let snapshots: Vec<SnapshotRef> = measurements.iter().flat_map(|m| m.snapshots()).collect();
        for m in measurements.iter() {
            m.clear_remote_id();
        }
        for s in &snapshots {
            s.clear_file_name();
        }
        let seeded = ChangeSet::seeded(measurements.clone(), snapshots);
        let count = seeded.len();
        self.changes.replace(seeded)?;
        Ok(count)
    }
}

fn ensure_present(measurements: &[MeasurementRef], measurement: &MeasurementRef) -> SyncResult<()> {
    if measurements.iter().any(|m| Arc::ptr_eq(m, measurement)) {
        Ok(())
    } else {
        Err(SyncError::NotInInventory(measurement.local_id().to_string()))
    }
}
