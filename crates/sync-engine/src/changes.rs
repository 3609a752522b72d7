// crates/sync-engine/src/changes.rs
//! Pending local edits and their coalescing rules
//!
//! A `ChangeSet` accumulates edits between flushes. Registration coalesces
//! edits so the network layer never sees churn: adding then deleting a
//! measurement that was never uploaded leaves nothing to send, and repeated
//! registrations never produce duplicate requests.
//!
//! Entries are compared by instance identity (`Arc::ptr_eq`), not by value.

use crate::error::{SyncError, SyncResult};
use crate::types::ChangeType;
use measvre_core::{MeasurementRef, SnapshotRef};
use std::sync::{Arc, Mutex, MutexGuard};

fn contains<T>(list: &[Arc<T>], item: &Arc<T>) -> bool {
    list.iter().any(|x| Arc::ptr_eq(x, item))
}

fn insert<T>(list: &mut Vec<Arc<T>>, item: &Arc<T>) -> bool {
    if contains(list, item) {
        false
    } else {
        list.push(Arc::clone(item));
        true
    }
}

fn remove<T>(list: &mut Vec<Arc<T>>, item: &Arc<T>) -> bool {
    match list.iter().position(|x| Arc::ptr_eq(x, item)) {
        Some(pos) => {
            list.remove(pos);
            true
        }
        None => false,
    }
}

/// Coalesced set of edits awaiting upload
///
/// A measurement is in at most one of the new/updated/deleted buckets, a
/// snapshot in at most one of the new/deleted buckets.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub(crate) new_measurements: Vec<MeasurementRef>,
    pub(crate) updated_measurements: Vec<MeasurementRef>,
    pub(crate) deleted_measurements: Vec<MeasurementRef>,
    pub(crate) new_snapshots: Vec<SnapshotRef>,
    pub(crate) deleted_snapshots: Vec<SnapshotRef>,
}

impl ChangeSet {
    /// Creates an empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a change set where everything given is new
    ///
    /// Used when a project is created and the whole local inventory must be
    /// uploaded to it.
    pub fn seeded(measurements: Vec<MeasurementRef>, snapshots: Vec<SnapshotRef>) -> Self {
        let mut set = Self::new();
        for m in &measurements {
            insert(&mut set.new_measurements, m);
        }
        for s in &snapshots {
            insert(&mut set.new_snapshots, s);
        }
        set
    }

    /// Registers an edit to a measurement
    pub fn register_measurement(&mut self, change: ChangeType, measurement: &MeasurementRef) {
        match change {
            ChangeType::Added => {
                // Re-adding an instance whose deletion is still pending
                // cancels the deletion; the server copy needs a refresh.
                if remove(&mut self.deleted_measurements, measurement) {
                    insert(&mut self.updated_measurements, measurement);
                } else {
                    insert(&mut self.new_measurements, measurement);
                }
            }
            ChangeType::Deleted => {
                if !remove(&mut self.new_measurements, measurement) {
                    remove(&mut self.updated_measurements, measurement);
                    insert(&mut self.deleted_measurements, measurement);
                }

                // Snapshot edits of a deleted measurement are moot
                self.new_snapshots.retain(|s| !s.belongs_to(measurement));
                self.deleted_snapshots.retain(|s| !s.belongs_to(measurement));
            }
            ChangeType::Modified => {
                if !contains(&self.new_measurements, measurement)
                    && !contains(&self.deleted_measurements, measurement)
                {
                    insert(&mut self.updated_measurements, measurement);
                }
            }
        }
    }

    /// Registers an edit to a snapshot
    ///
    /// Snapshots are immutable, so `Modified` is ignored.
    pub fn register_snapshot(&mut self, change: ChangeType, snapshot: &SnapshotRef) {
        match change {
            ChangeType::Added => {
                let owner_deleted = self
                    .deleted_measurements
                    .iter()
                    .any(|m| snapshot.belongs_to(m));
                if owner_deleted {
                    return;
                }
                if !remove(&mut self.deleted_snapshots, snapshot) {
                    insert(&mut self.new_snapshots, snapshot);
                }
            }
            ChangeType::Deleted => {
                if !remove(&mut self.new_snapshots, snapshot) {
                    insert(&mut self.deleted_snapshots, snapshot);
                }
            }
            ChangeType::Modified => {
                log::debug!("Ignoring modification of snapshot {:?}", snapshot.local_id());
            }
        }
    }

    /// Merges an earlier change set into this one
    ///
    /// Every entry of both sets survives unless a newer edit in `self`
    /// cancels it (for example, a failed add of a measurement that has been
    /// deleted since). Entries of `self` are replayed on top of `earlier`.
    pub fn merge(&mut self, earlier: ChangeSet) {
        let later = std::mem::replace(self, earlier);

        for m in &later.new_measurements {
            self.register_measurement(ChangeType::Added, m);
        }
        for m in &later.updated_measurements {
            self.register_measurement(ChangeType::Modified, m);
        }
        for m in &later.deleted_measurements {
            self.register_measurement(ChangeType::Deleted, m);
        }
        for s in &later.new_snapshots {
            self.register_snapshot(ChangeType::Added, s);
        }
        for s in &later.deleted_snapshots {
            self.register_snapshot(ChangeType::Deleted, s);
        }
    }

    /// Fixes up entries whose server identity is missing
    ///
    /// An updated measurement without an id is uploaded in full instead; a
    /// deleted measurement or snapshot without an id never reached the
    /// server and is dropped.
    pub(crate) fn reconcile_unassigned(&mut self) {
        let (unassigned, assigned): (Vec<_>, Vec<_>) = self
            .updated_measurements
            .drain(..)
            .partition(|m| m.remote_id().is_none());
        self.updated_measurements = assigned;
        for m in &unassigned {
            insert(&mut self.new_measurements, m);
        }

        self.deleted_measurements.retain(|m| {
            let known = m.remote_id().is_some();
            if !known {
                log::debug!("Dropping delete of never-uploaded measurement {}", m.local_id());
            }
            known
        });
        self.deleted_snapshots.retain(|s| s.file_name().is_some());
    }

    pub fn new_measurements(&self) -> &[MeasurementRef] {
        &self.new_measurements
    }

    pub fn updated_measurements(&self) -> &[MeasurementRef] {
        &self.updated_measurements
    }

    pub fn deleted_measurements(&self) -> &[MeasurementRef] {
        &self.deleted_measurements
    }

    pub fn new_snapshots(&self) -> &[SnapshotRef] {
        &self.new_snapshots
    }

    pub fn deleted_snapshots(&self) -> &[SnapshotRef] {
        &self.deleted_snapshots
    }

    /// Returns true if `measurement` is in any bucket
    pub fn contains_measurement(&self, measurement: &MeasurementRef) -> bool {
        contains(&self.new_measurements, measurement)
            || contains(&self.updated_measurements, measurement)
            || contains(&self.deleted_measurements, measurement)
    }

    /// Returns true if `snapshot` is in any bucket
    pub fn contains_snapshot(&self, snapshot: &SnapshotRef) -> bool {
        contains(&self.new_snapshots, snapshot) || contains(&self.deleted_snapshots, snapshot)
    }

    /// Total number of pending entries
    pub fn len(&self) -> usize {
        self.new_measurements.len()
            + self.updated_measurements.len()
            + self.deleted_measurements.len()
            + self.new_snapshots.len()
            + self.deleted_snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The live change set, shared between editors and the sync worker
///
/// Every operation holds the lock only for in-memory work.
#[derive(Debug, Clone, Default)]
pub struct PendingChanges {
    inner: Arc<Mutex<ChangeSet>>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> SyncResult<MutexGuard<'_, ChangeSet>> {
        self.inner.lock().map_err(|_| SyncError::LockPoisoned)
    }

    /// Registers an edit to a measurement
    pub fn register_measurement(&self, change: ChangeType, measurement: &MeasurementRef) -> SyncResult<()> {
        self.lock()?.register_measurement(change, measurement);
        Ok(())
    }

    /// Registers an edit to a snapshot
    pub fn register_snapshot(&self, change: ChangeType, snapshot: &SnapshotRef) -> SyncResult<()> {
        self.lock()?.register_snapshot(change, snapshot);
        Ok(())
    }

    /// Swaps the live set for an empty one and returns the old contents
    pub fn take(&self) -> SyncResult<ChangeSet> {
        Ok(std::mem::take(&mut *self.lock()?))
    }

    /// Puts unresolved entries back for the next flush
    pub fn merge(&self, remainder: ChangeSet) -> SyncResult<()> {
        if remainder.is_empty() {
            return Ok(());
        }
        self.lock()?.merge(remainder);
        Ok(())
    }

    /// Replaces the live set wholesale
    pub fn replace(&self, set: ChangeSet) -> SyncResult<()> {
        *self.lock()? = set;
        Ok(())
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> SyncResult<ChangeSet> {
        Ok(self.lock()?.clone())
    }

    /// Number of pending entries, 0 if the lock is poisoned
    pub fn pending_count(&self) -> usize {
        self.inner.lock().map(|set| set.len()).unwrap_or(0)
    }
}
