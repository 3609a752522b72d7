// crates/sync-engine/src/orchestrator.rs
//! The upload protocol
//!
//! A flush hands the orchestrator a change set taken from the live one.
//! New measurements are uploaded first, since snapshot endpoints are
//! addressed by measurement id. The update, snapshot-delete and
//! snapshot-add groups then run concurrently. Whatever did not succeed is
//! merged back into the live change set for the next flush.
//!
//! Failures never escape `upload`: they are logged, re-queued and
//! summarised in a status message.

use crate::api::LogApi;
use crate::changes::{ChangeSet, PendingChanges};
use crate::error::{SyncError, SyncResult};
use crate::inventory::Inventory;
use crate::notifications::Notifier;
use crate::session::Session;
use crate::types::{ProjectInfo, UploadReport};
use chrono::Utc;
use futures::future::join_all;
use measvre_core::{MeasurementRef, SnapshotRef};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const STATUS_UPLOADED: &str = "Successfully uploaded changes";
pub const STATUS_UPLOAD_FAILED: &str = "Failed to upload (some) changes";
pub const STATUS_PROJECT_CREATED: &str = "Project created";
pub const STATUS_PROJECT_FAILED: &str = "Failed to create project";
pub const STATUS_NO_PROJECT: &str = "Create a project before uploading changes";

/// Snapshots grouped by the server id of their measurement
#[derive(Debug, Default)]
struct SnapshotGroups {
    by_measurement: BTreeMap<i64, Vec<SnapshotRef>>,
    /// Owner exists but has no server id yet
    unassigned: Vec<SnapshotRef>,
}

impl SnapshotGroups {
    fn group(snapshots: Vec<SnapshotRef>) -> Self {
        let mut groups = Self::default();
        for snapshot in snapshots {
            match snapshot.measurement() {
                Some(owner) => match owner.remote_id() {
                    Some(id) => groups.by_measurement.entry(id).or_default().push(snapshot),
                    None => groups.unassigned.push(snapshot),
                },
                None => {
                    log::warn!(
                        "Dropping snapshot {:?}: its measurement no longer exists",
                        snapshot.local_id()
                    );
                }
            }
        }
        groups
    }
}

/// Executes uploads and project calls against a `LogApi`
#[derive(Clone)]
pub struct SyncOrchestrator {
    api: Arc<dyn LogApi>,
    session: Arc<Session>,
    changes: PendingChanges,
    notifier: Notifier,
}

impl SyncOrchestrator {
    pub fn new(api: Arc<dyn LogApi>, session: Arc<Session>, changes: PendingChanges, notifier: Notifier) -> Self {
        Self {
            api,
            session,
            changes,
            notifier,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Takes the live change set and uploads it
    pub async fn flush(&self) -> SyncResult<UploadReport> {
        let set = self.changes.take()?;
        Ok(self.upload(set).await)
    }

    /// Uploads `set`, re-queuing whatever fails
    pub async fn upload(&self, mut set: ChangeSet) -> UploadReport {
        let mut report = UploadReport::new();

        let Some(key) = self.session.key() else {
            if !set.is_empty() {
                log::warn!("{} pending changes but no project", set.len());
                self.notifier.notify(STATUS_NO_PROJECT);
            }
            report.project_missing = true;
            report.requeued = set.len();
            self.requeue(set);
            return report;
        };

        set.reconcile_unassigned();
        if set.is_empty() {
            return report;
        }
        log::info!("Uploading {} changes to project {}", set.len(), key);

        // Step 1: snapshot endpoints need the ids assigned here
        if !set.new_measurements.is_empty() {
            let ok = self.add_measurements(&key, &mut set.new_measurements).await;
            report.record(ok);
        }

        // Step 2: independent groups
        let ChangeSet {
            updated_measurements,
            deleted_measurements,
            new_snapshots,
            deleted_snapshots,
            ..
        } = &mut set;
        let (update, deletes, adds) = tokio::join!(
            self.update_measurements(&key, updated_measurements, deleted_measurements),
            self.delete_snapshots(&key, deleted_snapshots),
            self.add_snapshots(&key, new_snapshots),
        );
        if let Some(ok) = update {
            report.record(ok);
        }
        for ok in deletes.into_iter().chain(adds) {
            report.record(ok);
        }

        report.requeued = set.len();
        if report.requeued > 0 {
            log::info!("Re-queuing {} changes for the next flush", report.requeued);
        }
        self.requeue(set);
        report.finished_at = Utc::now();

        if report.was_attempted() {
            let status = if report.is_success() {
                STATUS_UPLOADED
            } else {
                STATUS_UPLOAD_FAILED
            };
            self.notifier.notify(status);
        }
        report
    }

    async fn add_measurements(&self, key: &str, pending: &mut Vec<MeasurementRef>) -> bool {
        let records: Vec<_> = pending.iter().map(|m| m.to_record()).collect();
        let ids = match self.api.add_measurements(key, &records).await {
            Ok(ids) => ids,
            Err(e) => {
                log_failure("add measurements", &e);
                return false;
            }
        };

        for (measurement, id) in pending.iter().zip(&ids) {
            measurement.set_remote_id(*id);
        }
        let assigned = ids.len().min(pending.len());
        pending.drain(..assigned);

        if ids.len() < records.len() {
            log::warn!(
                "Server returned {} ids for {} measurements",
                ids.len(),
                records.len()
            );
            return false;
        }
        true
    }

    /// Returns `None` when there was nothing to send
    async fn update_measurements(
        &self,
        key: &str,
        updated: &mut Vec<MeasurementRef>,
        deleted: &mut Vec<MeasurementRef>,
    ) -> Option<bool> {
        if updated.is_empty() && deleted.is_empty() {
            return None;
        }

        let remove: Vec<i64> = deleted.iter().filter_map(|m| m.remote_id()).collect();
        let replace: Vec<_> = updated.iter().map(|m| m.to_record()).collect();

        match self.api.update_measurements(key, &remove, &replace).await {
            Ok(()) => {
                updated.clear();
                deleted.clear();
                Some(true)
            }
            Err(e) => {
                log_failure("update measurements", &e);
                Some(false)
            }
        }
    }

    /// One outcome per request group
    async fn delete_snapshots(&self, key: &str, pending: &mut Vec<SnapshotRef>) -> Vec<bool> {
        if pending.is_empty() {
            return Vec::new();
        }
        let groups = SnapshotGroups::group(std::mem::take(pending));
        let mut outcomes = Vec::new();

        if !groups.unassigned.is_empty() {
            log::warn!(
                "{} snapshot deletions wait for their measurement's id",
                groups.unassigned.len()
            );
            pending.extend(groups.unassigned);
            outcomes.push(false);
        }

        let requests = groups.by_measurement.into_iter().map(|(id, group)| async move {
            let names: Vec<String> = group.iter().filter_map(|s| s.file_name()).collect();
            let result = self.api.delete_snapshots(key, id, &names).await;
            (id, group, result)
        });

        for (id, group, result) in join_all(requests).await {
            match result {
                Ok(()) => outcomes.push(true),
                Err(e) => {
                    log_failure(&format!("delete snapshots of measurement {}", id), &e);
                    pending.extend(group);
                    outcomes.push(false);
                }
            }
        }
        outcomes
    }

    /// One outcome per request group
    async fn add_snapshots(&self, key: &str, pending: &mut Vec<SnapshotRef>) -> Vec<bool> {
        if pending.is_empty() {
            return Vec::new();
        }
        let groups = SnapshotGroups::group(std::mem::take(pending));
        let mut outcomes = Vec::new();

        if !groups.unassigned.is_empty() {
            log::warn!(
                "{} snapshots wait for their measurement to be uploaded",
                groups.unassigned.len()
            );
            pending.extend(groups.unassigned);
            outcomes.push(false);
        }

        let requests = groups.by_measurement.into_iter().map(|(id, group)| async move {
            let images: Vec<Vec<u8>> = group.iter().map(|s| s.encoded().to_vec()).collect();
            let result = self.api.add_snapshots(key, id, &images).await;
            (id, group, result)
        });

        for (id, mut group, result) in join_all(requests).await {
            match result {
                Ok(names) => {
                    for (snapshot, name) in group.iter().zip(&names) {
                        snapshot.set_file_name(name.as_str());
                    }
                    let assigned = names.len().min(group.len());
                    let short = assigned < group.len();
                    if short {
                        log::warn!(
                            "Server returned {} file names for {} snapshots of measurement {}",
                            names.len(),
                            group.len(),
                            id
                        );
                    }
                    pending.extend(group.drain(assigned..));
                    outcomes.push(!short);
                }
                Err(e) => {
                    log_failure(&format!("add snapshots to measurement {}", id), &e);
                    pending.extend(group);
                    outcomes.push(false);
                }
            }
        }
        outcomes
    }

    /// Creates a project and marks the whole inventory for upload to it
    ///
    /// On failure the key and the live change set are left untouched.
    pub async fn create_project(&self, name: &str, inventory: &Inventory) -> SyncResult<ProjectInfo> {
        let info = match self.api.create_project(name).await {
            Ok(info) => info,
            Err(e) => {
                log_failure("create project", &e);
                self.notifier.notify(STATUS_PROJECT_FAILED);
                return Err(e);
            }
        };

        let seeded = match inventory.reseed_changes() {
            Ok(seeded) => seeded,
            Err(e) => {
                log_failure("queue inventory for new project", &e);
                self.notifier.notify(STATUS_PROJECT_FAILED);
                return Err(e);
            }
        };
        self.session.set_key(info.key.as_str());
        log::info!(
            "Created project '{}' with key {}; {} entries queued for upload",
            info.name,
            info.key,
            seeded
        );
        self.notifier.notify(STATUS_PROJECT_CREATED);
        Ok(info)
    }

    /// Deletes the current project and forgets its key
    pub async fn delete_project(&self) -> SyncResult<()> {
        let key = self.session.key().ok_or(SyncError::NoProject)?;
        if let Err(e) = self.api.delete_project(&key).await {
            log_failure("delete project", &e);
            return Err(e);
        }
        self.session.clear_key();
        log::info!("Deleted project {}", key);
        Ok(())
    }

    /// Downloads the current project's archive into `dest_dir`
    ///
    /// Returns the path written.
    pub async fn download_project(&self, dest_dir: &Path) -> SyncResult<PathBuf> {
        let key = self.session.key().ok_or(SyncError::NoProject)?;
        let archive = match self.api.download_project(&key).await {
            Ok(archive) => archive,
            Err(e) => {
                log_failure("download project", &e);
                return Err(e);
            }
        };

        let name = archive_file_name(archive.filename.as_deref(), &key);
        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(name);
        tokio::fs::write(&path, &archive.bytes).await?;

        log::info!("Saved {} bytes to {}", archive.bytes.len(), path.display());
        Ok(path)
    }

    fn requeue(&self, remainder: ChangeSet) {
        if let Err(e) = self.changes.merge(remainder) {
            log::error!("Could not re-queue failed changes: {}", e);
        }
    }
}

/// File name to store a downloaded archive under
///
/// Only the final path component of the server's name is used.
fn archive_file_name(suggested: Option<&str>, key: &str) -> String {
    suggested
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}.zip", key))
}

fn log_failure(operation: &str, error: &SyncError) {
    match error {
        SyncError::MalformedResponse(detail) => {
            log::error!("Unexpected response to {}: {}", operation, detail)
        }
        SyncError::Server { message, .. } => {
            log::warn!("Server rejected {}: {}", operation, message)
        }
        other => log::warn!("Failed to {}: {}", operation, other),
    }
}
