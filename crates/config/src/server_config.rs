//! Logging server connection section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Where the logging server lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path prefix of the API, e.g. `/measvre-api`
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            base_path: "/measvre-api".to_string(),
        }
    }
}

impl ConfigSection for ServerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::not_empty(&self.host, "server.host"),
            Validator::no_whitespace(&self.host, "server.host"),
            Validator::in_range(self.port, 1, u16::MAX, "server.port"),
        ];
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            results.push(Err(ValidationError::with_value(
                "server.base_path",
                "must start with '/'",
                &self.base_path,
            )));
        }
        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.host = other.host;
        self.port = other.port;
        self.base_path = other.base_path;
    }

    fn section_name(&self) -> &'static str {
        "server"
    }
}
