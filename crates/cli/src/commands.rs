// FILE: crates/cli/src/commands.rs

use crate::manifest::Manifest;
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use measvre_config::{Config, ConfigManager, SyncConfig};
use measvre_network::ClientConfig;
use measvre_resilience::RetryPolicy;
use measvre_sync_engine::{LogService, NotificationReceiver, Session, UploadReport};
use std::path::{Path, PathBuf};

/// Create an empty project and print its key
pub async fn create_project(config: &Config, name: &str) -> Result<()> {
    let (service, mut notices) = connect(config, None)?;

    let result = service
        .create_project(name)
        .context("Failed to queue project creation")?
        .wait()
        .await;
    print_notices(&mut notices);
    service.shutdown()?;

    let project = result.context("Failed to create project")?;
    println!("{} Project created", style("✓").green().bold());
    println!("  Name: {}", project.name);
    println!("  Key: {}", style(&project.key).bold());
    Ok(())
}

/// Delete a project on the server
pub async fn delete_project(config: &Config, key: &str) -> Result<()> {
    let (service, mut notices) = connect(config, Some(key))?;

    let result = service
        .delete_project()
        .context("Failed to queue project deletion")?
        .wait()
        .await;
    print_notices(&mut notices);
    service.shutdown()?;

    result.with_context(|| format!("Failed to delete project {}", key))?;
    println!("{} Project {} deleted", style("✓").green().bold(), key);
    Ok(())
}

/// Download a project archive
pub async fn download(config: &Config, matches: &ArgMatches) -> Result<()> {
    let key = matches
        .get_one::<String>("key")
        .ok_or_else(|| anyhow::anyhow!("Project key is required"))?;
    let output = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let (service, mut notices) = connect(config, Some(key))?;
    let result = service
        .download_project(output)
        .context("Failed to queue download")?
        .wait()
        .await;
    print_notices(&mut notices);
    service.shutdown()?;

    let path = result.with_context(|| format!("Failed to download project {}", key))?;
    println!("{} Saved {}", style("✓").green().bold(), path.display());
    Ok(())
}

/// Upload the measurements described by a JSON file
///
/// Creates a new project unless `--key` names an existing one.
pub async fn push(config: &Config, matches: &ArgMatches) -> Result<()> {
    let name = matches
        .get_one::<String>("name")
        .ok_or_else(|| anyhow::anyhow!("Project name is required"))?;
    let file = matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("Measurement file is required"))?;
    let key = matches.get_one::<String>("key").map(String::as_str);

    let registry = config.kind_registry().context("Invalid measurement kinds in config")?;
    let manifest = Manifest::load(&file)?;
    let prepared = manifest.prepare(&registry, base_dir(&file))?;

    let mut project_config = config.clone();
    project_config.project.name = name.clone();
    let (service, mut notices) = connect(&project_config, key)?;

    let inventory = service.inventory();
    for entry in &prepared {
        inventory.add(&entry.measurement)?;
        for png in &entry.snapshots {
            inventory.add_snapshot(&entry.measurement, png.clone())?;
        }
    }
    log::info!("Prepared {} measurements from {}", inventory.len(), file.display());

    if key.is_none() {
        let created = service
            .create_project(name.as_str())
            .context("Failed to queue project creation")?
            .wait()
            .await;
        if let Err(e) = created {
            print_notices(&mut notices);
            service.shutdown()?;
            return Err(e).context("Failed to create project");
        }
    }

    let report = service.flush().context("Failed to queue upload")?.wait().await;
    print_notices(&mut notices);
    let pending = service.pending_changes().pending_count();
    let project_key = service.session().key();
    service.shutdown()?;

    let report = report.context("Upload failed")?;
    print_report(&report, pending);
    if let Some(key) = project_key {
        println!("  Project key: {}", style(key).bold());
    }

    if !report.is_success() {
        bail!("{} of {} operations failed", report.failed, report.attempted);
    }
    Ok(())
}

/// Print the effective configuration
pub fn show_config(manager: &ConfigManager, config: &Config) -> Result<()> {
    let text = config.to_toml().context("Failed to serialize config")?;
    println!("# {}", manager.config_path().display());
    print!("{}", text);
    Ok(())
}

/// Write a default config file if none exists
pub fn init_config(manager: &ConfigManager) -> Result<()> {
    if manager.initialize().context("Failed to write config file")? {
        println!(
            "{} Wrote {}",
            style("✓").green().bold(),
            manager.config_path().display()
        );
    } else {
        println!("Config already exists at {}", manager.config_path().display());
    }
    Ok(())
}

fn connect(config: &Config, key: Option<&str>) -> Result<(LogService, NotificationReceiver)> {
    let session = session_for(config, key);
    LogService::connect(session, client_config(&config.sync))
        .with_context(|| format!("Failed to connect to {}:{}", config.server.host, config.server.port))
}

fn session_for(config: &Config, key: Option<&str>) -> Session {
    let session = Session::new(
        config.server.host.clone(),
        config.server.port,
        config.project.name.clone(),
    )
    .with_base_path(config.server.base_path.clone());

    match key {
        Some(key) => session.with_key(key),
        None => session,
    }
}

fn client_config(sync: &SyncConfig) -> ClientConfig {
    let retry = RetryPolicy::new(sync.max_attempts as usize)
        .with_initial_delay(sync.initial_backoff())
        .with_max_delay(sync.max_backoff());

    ClientConfig {
        timeout: sync.request_timeout(),
        retry_policy: Some(retry),
        ..ClientConfig::default()
    }
}

fn base_dir(file: &Path) -> &Path {
    file.parent().unwrap_or_else(|| Path::new("."))
}

fn print_notices(notices: &mut NotificationReceiver) {
    for notice in notices.drain() {
        println!("{} {}", style("›").cyan(), notice);
    }
}

fn print_report(report: &UploadReport, pending: usize) {
    let mark = if report.is_success() {
        style("✓").green().bold()
    } else {
        style("✗").red().bold()
    };
    println!(
        "{} Upload finished at {}",
        mark,
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Operations: {} attempted, {} failed", report.attempted, report.failed);
    if report.project_missing {
        println!("  No project: nothing was sent");
    }
    if pending > 0 {
        println!("  Still pending: {}", pending);
    }
}
