// crates/sync-engine/src/api.rs
//! The remote logging API
//!
//! `LogApi` is the seam between the orchestrator and the server. The
//! production implementation, `HttpLogApi`, speaks HTTP through
//! `measvre_network::Client`; tests substitute an in-memory fake.

use crate::error::{SyncError, SyncResult};
use crate::protocol::{
    snapshot_form, AddMeasurementsRequest, CreateProjectRequest, DeleteSnapshotsRequest,
    ResponseMessage, UpdateMeasurementsRequest,
};
use crate::session::Session;
use crate::types::{ProjectArchive, ProjectInfo};
use async_trait::async_trait;
use measvre_core::MeasurementRecord;
use measvre_network::{Client, HttpResponse, NetworkError};
use std::sync::Arc;

/// Calls offered by the logging server
#[async_trait]
pub trait LogApi: Send + Sync {
    /// `POST /projects`
    async fn create_project(&self, name: &str) -> SyncResult<ProjectInfo>;

    /// `DELETE /projects/{key}`
    async fn delete_project(&self, key: &str) -> SyncResult<()>;

    /// `GET /projects/{key}`
    async fn download_project(&self, key: &str) -> SyncResult<ProjectArchive>;

    /// `POST /projects/{key}/measurements`, returning ids in submission order
    async fn add_measurements(&self, key: &str, measurements: &[MeasurementRecord]) -> SyncResult<Vec<i64>>;

    /// `PATCH /projects/{key}/measurements`
    async fn update_measurements(
        &self,
        key: &str,
        remove: &[i64],
        replace: &[MeasurementRecord],
    ) -> SyncResult<()>;

    /// `POST /projects/{key}/measurements/{id}/snapshots`, returning file
    /// names in submission order
    async fn add_snapshots(&self, key: &str, measurement_id: i64, images: &[Vec<u8>]) -> SyncResult<Vec<String>>;

    /// `PATCH /projects/{key}/measurements/{id}/snapshots`
    async fn delete_snapshots(&self, key: &str, measurement_id: i64, file_names: &[String]) -> SyncResult<()>;
}

/// `LogApi` over HTTP
#[derive(Clone)]
pub struct HttpLogApi {
    client: Client,
    session: Arc<Session>,
}

impl HttpLogApi {
    pub fn new(client: Client, session: Arc<Session>) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

/// Turns a non-2xx response into a server error carrying its `message`
fn into_sync_error(error: NetworkError) -> SyncError {
    match error {
        NetworkError::Status { status, body } => {
            let message = ResponseMessage::error_text(&body).unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body
                }
            });
            SyncError::Server {
                status: Some(status),
                message,
            }
        }
        other => SyncError::Network(other),
    }
}

fn read(response: &HttpResponse) -> SyncResult<ResponseMessage> {
    ResponseMessage::parse(&response.body)?.into_result()
}

#[async_trait]
impl LogApi for HttpLogApi {
    async fn create_project(&self, name: &str) -> SyncResult<ProjectInfo> {
        let body = CreateProjectRequest::new(name);
        let response = self
            .client
            .post_json(&self.session.projects_url(), &body)
            .await
            .map_err(into_sync_error)?;

        let message = read(&response)?;
        let returned_name = message.name.clone();
        let key = message.require_key()?;
        Ok(ProjectInfo {
            key,
            name: returned_name.unwrap_or_else(|| name.to_string()),
        })
    }

    async fn delete_project(&self, key: &str) -> SyncResult<()> {
        let response = self
            .client
            .delete(&self.session.project_url(key))
            .await
            .map_err(into_sync_error)?;
        read(&response)?;
        Ok(())
    }

    async fn download_project(&self, key: &str) -> SyncResult<ProjectArchive> {
        let response = self
            .client
            .get(&self.session.project_url(key))
            .await
            .map_err(into_sync_error)?;
        Ok(ProjectArchive {
            filename: response.filename,
            bytes: response.body.to_vec(),
        })
    }

    async fn add_measurements(&self, key: &str, measurements: &[MeasurementRecord]) -> SyncResult<Vec<i64>> {
        let body = AddMeasurementsRequest::new(measurements.to_vec());
        let response = self
            .client
            .post_json(&self.session.measurements_url(key), &body)
            .await
            .map_err(into_sync_error)?;
        read(&response)?.require_ids()
    }

    async fn update_measurements(
        &self,
        key: &str,
        remove: &[i64],
        replace: &[MeasurementRecord],
    ) -> SyncResult<()> {
        let body = UpdateMeasurementsRequest::new(remove.to_vec(), replace.to_vec());
        let response = self
            .client
            .patch_json(&self.session.measurements_url(key), &body)
            .await
            .map_err(into_sync_error)?;
        read(&response)?;
        Ok(())
    }

    async fn add_snapshots(&self, key: &str, measurement_id: i64, images: &[Vec<u8>]) -> SyncResult<Vec<String>> {
        let url = self.session.snapshots_url(key, measurement_id);
        let response = self
            .client
            .post_multipart(&url, || snapshot_form(measurement_id, images))
            .await
            .map_err(into_sync_error)?;
        read(&response)?.require_file_names()
    }

    async fn delete_snapshots(&self, key: &str, measurement_id: i64, file_names: &[String]) -> SyncResult<()> {
        let body = DeleteSnapshotsRequest::new(file_names.to_vec());
        let response = self
            .client
            .patch_json(&self.session.snapshots_url(key, measurement_id), &body)
            .await
            .map_err(into_sync_error)?;
        read(&response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_carries_server_message() {
        let err = into_sync_error(NetworkError::Status {
            status: 404,
            body: r#"{"message": "Project not found"}"#.to_string(),
        });
        match err {
            SyncError::Server { status, message } => {
                assert_eq!(status, Some(404));
                assert_eq!(message, "Project not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_status_error_without_envelope() {
        let err = into_sync_error(NetworkError::Status {
            status: 502,
            body: String::new(),
        });
        assert_eq!(err.to_string(), "Server error (502): HTTP 502");
        assert!(err.is_transient());
    }

    #[test]
    fn test_transport_error_stays_network() {
        let err = into_sync_error(NetworkError::Timeout);
        assert!(matches!(err, SyncError::Network(NetworkError::Timeout)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let session = Arc::new(Session::new("127.0.0.1", 9, "demo"));
        let client = Client::with_config(measvre_network::ClientConfig {
            retry_policy: None,
            timeout: std::time::Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();
        let api = HttpLogApi::new(client, session);

        let err = api.create_project("demo").await.unwrap_err();
        assert!(matches!(err, SyncError::Network(_)));
    }
}
