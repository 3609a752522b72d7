//! Edge case tests for configuration loading and saving

use measvre_config::{Config, ConfigError, ConfigManager};
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manager =
        ConfigManager::with_directory(temp_dir.path().to_path_buf()).expect("Failed to create manager");
    (temp_dir, manager)
}

#[test]
fn test_corrupted_config_uses_defaults() {
    let (_temp_dir, manager) = setup();
    fs::write(manager.config_path(), "server = [[[").unwrap();

    assert!(matches!(manager.load(), Err(ConfigError::ParseError { .. })));
    assert_eq!(manager.load_or_default(), Config::default());
}

#[test]
fn test_empty_config_file() {
    let (_temp_dir, manager) = setup();
    fs::write(manager.config_path(), "").unwrap();
    assert!(matches!(manager.load(), Err(ConfigError::ReadError { .. })));
}

#[test]
fn test_wrong_value_type() {
    let (_temp_dir, manager) = setup();
    fs::write(manager.config_path(), "[server]\nport = \"five thousand\"\n").unwrap();
    assert!(manager.load().is_err());
}

#[test]
fn test_port_out_of_range_rejected_by_parser() {
    let (_temp_dir, manager) = setup();
    fs::write(manager.config_path(), "[server]\nport = 70000\n").unwrap();
    assert!(manager.load().is_err());
}

#[test]
fn test_save_creates_parent_directories() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let nested = temp_dir.path().join("a").join("b");
    let manager = ConfigManager::with_directory(nested.clone())?;

    manager.save(&Config::default())?;
    assert!(nested.join("config.toml").exists());
    Ok(())
}

#[test]
fn test_unknown_sections_ignored() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup();
    fs::write(manager.config_path(), "[legacy]\nfoo = 1\n\n[project]\nname = \"pier\"\n")?;

    let config = manager.load()?;
    assert_eq!(config.project.name, "pier");
    Ok(())
}

#[test]
fn test_newer_version_still_loads() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup();
    fs::write(manager.config_path(), "version = 99\n")?;

    let config = manager.load()?;
    assert_eq!(config.version, 99);
    Ok(())
}

#[test]
fn test_whitespace_in_host() {
    let mut config = Config::default();
    config.server.host = "my host".to_string();
    let errors = config.validate().unwrap_err();
    assert!(errors.iter().any(|e| e.field == "server.host"));
}

#[test]
fn test_base_path_must_be_absolute() {
    let mut config = Config::default();
    config.server.base_path = "api".to_string();
    assert!(config.validate().is_err());

    config.server.base_path = String::new();
    assert!(config.validate().is_ok());
}

#[test]
fn test_backoff_order() {
    let mut config = Config::default();
    config.sync.initial_backoff_ms = 10_000;
    config.sync.max_backoff_ms = 100;
    assert!(config.validate().is_err());
}

#[test]
fn test_duplicate_and_empty_kinds() {
    let mut config = Config::default();
    config.measurements.kinds = vec!["Distance".to_string(), "Distance".to_string()];
    assert!(config.validate().is_err());

    config.measurements.kinds = Vec::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_all_validation_errors_collected() {
    let mut config = Config::default();
    config.server.port = 0;
    config.project.name = "   ".to_string();
    config.sync.request_timeout_secs = 0;

    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 3);
}

#[test]
fn test_update_with_invalid_value() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup();
    manager.save(&Config::default())?;

    let result = manager.update(|config| config.sync.max_attempts = 0);
    assert!(result.is_err());
    assert_eq!(manager.load()?.sync.max_attempts, 3);
    Ok(())
}

#[test]
fn test_rapid_saves() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup();
    for port in 5000..5010u16 {
        manager.update(|config| config.server.port = port)?;
    }
    assert_eq!(manager.load()?.server.port, 5009);
    Ok(())
}
