//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Prefix of environment variables that override file values
pub const ENV_PREFIX: &str = "MEASVRE";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration manager
///
/// Owns the config directory and hands out loaded configs. All writes
/// are validated first.
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a config manager for the platform config directory
    ///
    /// - Linux: `~/.config/measvre/`
    /// - macOS: `~/Library/Application Support/measvre/`
    /// - Windows: `%APPDATA%\measvre\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let persistence = ConfigPersistence::new(config_dir.join(CONFIG_FILE_NAME));
        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "measvre")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "Could not determine user config directory".to_string(),
            })
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads the configuration from file
    ///
    /// A missing file yields defaults; a corrupted one is an error.
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads, applies `update_fn` and saves the result
    ///
    /// ```rust,no_run
    /// # use measvre_config::ConfigManager;
    /// # let manager = ConfigManager::new().unwrap();
    /// manager.update(|config| {
    ///     config.server.port = 8080;
    /// }).expect("Failed to update config");
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if none exists
    ///
    /// Returns `Ok(true)` if a file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.persistence.write_default()?;
        Ok(true)
    }

    /// Overwrites the config file with defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Validates the current config file, returning every problem found
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;
        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config and applies `MEASVRE_SECTION_FIELD` overrides
    ///
    /// Example: `MEASVRE_SERVER_PORT=8080`
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_overrides(&mut config, |name| std::env::var(name).ok());

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }
        Ok(config)
    }
}

fn env_name(section: &str, field: &str) -> String {
    format!("{}_{}_{}", ENV_PREFIX, section, field).to_uppercase()
}

/// Applies overrides from `lookup`; unparsable values are logged and skipped
pub(crate) fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(&env_name("server", "host")) {
        config.server.host = host;
    }

    let port_var = env_name("server", "port");
    if let Some(port) = lookup(&port_var) {
        match port.parse::<u16>() {
            Ok(p) => config.server.port = p,
            Err(_) => log::warn!("Ignoring {}: '{}' is not a port", port_var, port),
        }
    }

    if let Some(name) = lookup(&env_name("project", "name")) {
        config.project.name = name;
    }

    let level_var = env_name("app", "log_level");
    if let Some(level) = lookup(&level_var) {
        match level.parse::<LogLevel>() {
            Ok(l) => config.app.log_level = l,
            Err(e) => log::warn!("Ignoring {}: {}", level_var, e),
        }
    }
}
