// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use measvre_config::{Config, ConfigManager};
use std::path::PathBuf;

mod commands;
mod manifest;

fn build_cli() -> Command {
    Command::new("measvre")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Upload VR measurements to a MeasVRe logging server")
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml")
                .global(true),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Logging server host (overrides config)")
                .global(true),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .help("Logging server port (overrides config)")
                .value_parser(clap::value_parser!(u16))
                .global(true),
        )
        .subcommand(
            Command::new("create-project")
                .about("Create an empty project and print its key")
                .arg(Arg::new("name").value_name("NAME").help("Project name (defaults to project.name)")),
        )
        .subcommand(
            Command::new("delete-project")
                .about("Delete a project on the server")
                .arg(Arg::new("key").required(true).value_name("KEY").help("Project key")),
        )
        .subcommand(
            Command::new("download")
                .about("Download a project archive")
                .arg(Arg::new("key").required(true).value_name("KEY").help("Project key"))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("DIR")
                        .help("Directory to write the archive to")
                        .default_value("."),
                ),
        )
        .subcommand(
            Command::new("push")
                .about("Upload measurements and snapshots described by a JSON file")
                .arg(Arg::new("name").required(true).value_name("NAME").help("Project name"))
                .arg(Arg::new("file").required(true).value_name("FILE").help("Measurement file (JSON)"))
                .arg(
                    Arg::new("key")
                        .short('k')
                        .long("key")
                        .value_name("KEY")
                        .help("Upload into an existing project instead of creating one"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect or initialize the configuration")
                .subcommand_required(true)
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("init").about("Write a default config file if none exists")),
        )
}

fn config_manager(matches: &ArgMatches) -> Result<ConfigManager> {
    let manager = match matches.get_one::<String>("config-dir") {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    };
    manager.context("Failed to locate config directory")
}

fn load_config(manager: &ConfigManager, matches: &ArgMatches) -> Result<Config> {
    let mut config = manager
        .load_with_env_overrides()
        .context("Failed to load configuration")?;

    if let Some(host) = matches.get_one::<String>("host") {
        config.server.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }
    Ok(config)
}

/// Logs at the configured level unless `RUST_LOG` is set
fn init_logging(config: &Config) {
    env_logger::Builder::new()
        .filter_level(config.app.log_level.to_filter())
        .parse_default_env()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let manager = config_manager(&matches)?;
    let config = load_config(&manager, &matches)?;
    init_logging(&config);

    match matches.subcommand() {
        Some(("create-project", sub_matches)) => {
            let name = sub_matches
                .get_one::<String>("name")
                .cloned()
                .unwrap_or_else(|| config.project.name.clone());
            commands::create_project(&config, &name).await
        }
        Some(("delete-project", sub_matches)) => {
            let key = sub_matches
                .get_one::<String>("key")
                .ok_or_else(|| anyhow::anyhow!("Project key is required"))?;
            commands::delete_project(&config, key).await
        }
        Some(("download", sub_matches)) => commands::download(&config, sub_matches).await,
        Some(("push", sub_matches)) => commands::push(&config, sub_matches).await,
        Some(("config", sub_matches)) => match sub_matches.subcommand() {
            Some(("show", _)) => commands::show_config(&manager, &config),
            Some(("init", _)) => commands::init_config(&manager),
            _ => Ok(()),
        },
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
