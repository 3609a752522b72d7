// crates/sync-engine/src/protocol.rs
//! Wire format of the logging API
//!
//! Request bodies are plain serde structs; responses share one envelope,
//! `ResponseMessage`, whose fields are present depending on the call.

use crate::error::{SyncError, SyncResult};
use measvre_core::MeasurementRecord;
use measvre_network::{multipart, NetworkResult};
use serde::{Deserialize, Serialize};

/// Body of `POST /projects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(rename = "projectName")]
    pub project_name: String,
}

/// Body of `POST /projects/{key}/measurements`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMeasurementsRequest {
    pub measurements: Vec<MeasurementRecord>,
}

/// Body of `PATCH /projects/{key}/measurements`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateMeasurementsRequest {
    /// Ids of deleted measurements
    pub remove: Vec<i64>,
    /// Full replacement payloads of modified measurements
    pub replace: Vec<MeasurementRecord>,
}

/// Body of `PATCH /projects/{key}/measurements/{id}/snapshots`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteSnapshotsRequest {
    /// File names of deleted snapshots
    pub remove: Vec<String>,
}

impl CreateProjectRequest {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
        }
    }
}

impl AddMeasurementsRequest {
    pub fn new(measurements: Vec<MeasurementRecord>) -> Self {
        Self { measurements }
    }
}

impl UpdateMeasurementsRequest {
    pub fn new(remove: Vec<i64>, replace: Vec<MeasurementRecord>) -> Self {
        Self { remove, replace }
    }
}

impl DeleteSnapshotsRequest {
    pub fn new(remove: Vec<String>) -> Self {
        Self { remove }
    }
}

/// Form field carrying the owning measurement id
pub const SNAPSHOT_ID_FIELD: &str = "id";
/// Form field name shared by every image part
pub const SNAPSHOT_FILE_FIELD: &str = "file";

/// Builds the multipart body of an add-snapshots request
///
/// Parts are named `snapshot{i}.png` in submission order, which is the
/// order of the `file_names` in the response.
pub fn snapshot_form(measurement_id: i64, images: &[Vec<u8>]) -> NetworkResult<multipart::Form> {
    let mut form = multipart::Form::new().text(SNAPSHOT_ID_FIELD, measurement_id.to_string());
    for (i, image) in images.iter().enumerate() {
        let part = multipart::Part::bytes(image.clone())
            .file_name(format!("snapshot{}.png", i))
            .mime_str("image/png")?;
        form = form.part(SNAPSHOT_FILE_FIELD, part);
    }
    Ok(form)
}

/// Response envelope shared by every endpoint
///
/// A present `message` means the server reported an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_names: Option<Vec<String>>,
}

impl ResponseMessage {
    /// Parses a response body; an empty body (e.g. 204) is an empty message
    pub fn parse(body: &[u8]) -> SyncResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| SyncError::MalformedResponse(e.to_string()))
    }

    /// Extracts the server message from an error body, if there is one
    pub fn error_text(body: &str) -> Option<String> {
        serde_json::from_str::<Self>(body).ok().and_then(|r| r.message)
    }

    /// Fails with `SyncError::Server` if the server reported a message
    pub fn into_result(self) -> SyncResult<Self> {
        match self.message {
            Some(message) => Err(SyncError::Server {
                status: None,
                message,
            }),
            None => Ok(self),
        }
    }

    pub fn require_key(self) -> SyncResult<String> {
        self.key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SyncError::MalformedResponse("missing project key".to_string()))
    }

    pub fn require_ids(self) -> SyncResult<Vec<i64>> {
        self.ids
            .ok_or_else(|| SyncError::MalformedResponse("missing measurement ids".to_string()))
    }

    pub fn require_file_names(self) -> SyncResult<Vec<String>> {
        self.file_names
            .ok_or_else(|| SyncError::MalformedResponse("missing snapshot file names".to_string()))
    }
}
