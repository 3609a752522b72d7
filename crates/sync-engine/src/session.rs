// crates/sync-engine/src/session.rs
//! Connection parameters and the current project key

use std::sync::RwLock;

/// Default API base path on the logging server
pub const DEFAULT_BASE_PATH: &str = "/measvre-api";

/// Connection parameters and project identity
///
/// The key is empty until a project exists on the server. Every
/// measurement and snapshot endpoint requires it.
#[derive(Debug)]
pub struct Session {
    host: String,
    port: u16,
    base_path: String,
    project_name: String,
    key: RwLock<Option<String>>,
}

impl Session {
    /// Creates a session without a project
    pub fn new(host: impl Into<String>, port: u16, project_name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            base_path: DEFAULT_BASE_PATH.to_string(),
            project_name: project_name.into(),
            key: RwLock::new(None),
        }
    }

    /// Overrides the API base path
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        let path = base_path.into();
        let trimmed = path.trim_end_matches('/');
        self.base_path = if trimmed.starts_with('/') || trimmed.is_empty() {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };
        self
    }

    /// Attaches an existing project key
    pub fn with_key(self, key: impl Into<String>) -> Self {
        self.set_key(key);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Current project key, if a project exists
    pub fn key(&self) -> Option<String> {
        self.key.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn has_project(&self) -> bool {
        self.key().is_some()
    }

    /// Stores the key returned by create-project; empty keys clear it
    pub fn set_key(&self, key: impl Into<String>) {
        let key = key.into();
        let mut slot = self.key.write().unwrap_or_else(|e| e.into_inner());
        *slot = if key.is_empty() { None } else { Some(key) };
    }

    pub fn clear_key(&self) {
        *self.key.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// `http://host:port/measvre-api`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.base_path)
    }

    /// `/projects`
    pub fn projects_url(&self) -> String {
        format!("{}/projects", self.base_url())
    }

    /// `/projects/{key}`, with the key percent-encoded as one path segment
    pub fn project_url(&self, key: &str) -> String {
        format!("{}/{}", self.projects_url(), urlencoding::encode(key))
    }

    /// `/projects/{key}/measurements`
    pub fn measurements_url(&self, key: &str) -> String {
        format!("{}/measurements", self.project_url(key))
    }

    /// `/projects/{key}/measurements/{id}/snapshots`
    pub fn snapshots_url(&self, key: &str, measurement_id: i64) -> String {
        format!("{}/{}/snapshots", self.measurements_url(key), measurement_id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new("127.0.0.1", 5000, "my_project")
    }
}
