//! MeasVRe configuration
//!
//! A single `config.toml` with one table per concern. Each section
//! implements `ConfigSection`, so validation and merging are uniform.
//!
//! - Missing files load as defaults; empty or unparsable files are errors
//! - Saving validates first and writes atomically
//! - Measurement kinds are resolved against the kind registry at startup
//!
//! # Example
//!
//! ```rust
//! use measvre_config::{Config, ConfigManager};
//!
//! let dir = tempfile::TempDir::new().unwrap();
//! let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! assert_eq!(config.server.port, 5000);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

// Config sections
mod app_config;
mod measurements_config;
mod project_config;
mod server_config;
mod sync_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use measurements_config::MeasurementsConfig;
pub use project_config::ProjectConfig;
pub use server_config::ServerConfig;
pub use sync_config::SyncConfig;

use measvre_core::KindRegistry;
use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,
    pub app: AppConfig,
    pub server: ServerConfig,
    pub project: ProjectConfig,
    pub sync: SyncConfig,
    pub measurements: MeasurementsConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates every section, returning all problems found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let results = [
            self.app.validate(),
            self.server.validate(),
            self.project.validate(),
            self.sync.validate(),
            self.measurements.validate(),
        ];
        for result in results {
            if let Err(mut e) = result {
                errors.append(&mut e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges another config into this one, preferring values from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.server.merge(other.server);
        self.project.merge(other.project);
        self.sync.merge(other.sync);
        self.measurements.merge(other.measurements);
    }

    /// Renders the config as it would be written to disk
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolves the configured measurement kinds
    ///
    /// Fails on the first unknown tag.
    pub fn kind_registry(&self) -> ConfigResult<KindRegistry> {
        Ok(self.measurements.registry()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            server: ServerConfig::default(),
            project: ProjectConfig::default(),
            sync: SyncConfig::default(),
            measurements: MeasurementsConfig::default(),
        }
    }
}
