use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config::{self, ConfigError, EngineConfig};
use crate::contract::ItemsResponse;
use crate::core_service::{CatalogService, ServiceError};
use crate::default_paths::{find_on_path, suggest_data_path, Platform, UserDirs};
use crate::logging::{self, LoggingError};
use crate::model::CanonicalItem;
use crate::settings::SettingsStore;
use crate::transport::handle_json;

const PREFIX: &str = "[recentfind]";

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Parser, PartialEq, Eq)]
#[command(
    name = "recentfind",
    version,
    about = "Recently used items from browsers, editors, IDEs and note stores"
)]
pub struct Cli {
    /// Config file (defaults to the per-user data dir).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to the rotating log file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Directory for the rotating log file; implies --log-file.
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Print the merged catalog, newest first.
    Catalog {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Search the catalog.
    Search {
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Show the readiness of every source.
    Status,
    /// Suggest data paths and a query tool for unconfigured sources.
    Suggest {
        /// Save suggestions that exist on disk into the config file.
        #[arg(long)]
        write: bool,
    },
    /// Answer one JSON request read from stdin.
    Request,
}

pub fn parse_cli_args(args: &[String]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("recentfind".to_string()).chain(args.iter().cloned()))
}

pub fn run_with_options(cli: Cli) -> Result<(), RuntimeError> {
    let config = config::load(cli.config.as_deref())?;
    init_logging(&cli, &config)?;
    log::info!(
        "startup command={:?} config_path={}",
        cli.command,
        config.config_path.display()
    );

    match cli.command {
        Command::Catalog { limit, json } => {
            let service = CatalogService::new(config)?;
            print_items(service.catalog(limit), json)
        }
        Command::Search { query, limit, json } => {
            let service = CatalogService::new(config)?;
            print_items(service.search(&query, limit)?, json)
        }
        Command::Status => {
            let service = CatalogService::new(config)?;
            for status in service.readiness() {
                println!("{:<18} {:<7} {}", status.id, format!("{:?}", status.state), status.name);
            }
            Ok(())
        }
        Command::Suggest { write } => suggest(config, write),
        Command::Request => {
            let service = CatalogService::new(config)?;
            let mut payload = String::new();
            std::io::stdin().read_to_string(&mut payload)?;
            println!("{}", handle_json(&service, &payload));
            Ok(())
        }
    }
}

fn init_logging(cli: &Cli, config: &EngineConfig) -> Result<(), LoggingError> {
    let level = config.log_level_filter();
    if cli.log_file || cli.log_dir.is_some() {
        let path = logging::init(cli.log_dir.as_deref(), level)?;
        eprintln!("{PREFIX} logging to {}", path.display());
        Ok(())
    } else {
        logging::init_stderr(level)
    }
}

fn print_items(items: Vec<CanonicalItem>, json: bool) -> Result<(), RuntimeError> {
    if json {
        println!("{}", serde_json::to_string_pretty(&ItemsResponse::from_items(items))?);
        return Ok(());
    }
    for item in &items {
        println!("{}", render_line(item));
    }
    Ok(())
}

pub fn render_line(item: &CanonicalItem) -> String {
    let missing = if item.exists { "" } else { " (missing)" };
    format!(
        "[{}] {}{missing}\n    {}\n    {}",
        item.source_id, item.title, item.description, item.launch
    )
}

fn suggest(mut config: EngineConfig, write: bool) -> Result<(), RuntimeError> {
    let Some(user_dirs) = UserDirs::detect() else {
        println!("{PREFIX} could not determine the home directory");
        return Ok(());
    };
    let platform = Platform::current();
    let service = CatalogService::new(config.clone())?;
    let mut changed = false;

    for source in service.sources() {
        let id = source.descriptor().id.clone();
        let current = config.source_config(&id);
        if current.data_path().is_some() {
            continue;
        }
        let Some(path) = suggest_data_path(&id, &user_dirs, platform) else {
            continue;
        };
        let exists = path.exists();
        println!(
            "{:<18} {}{}",
            id,
            path.display(),
            if exists { "" } else { " (not found)" }
        );
        if write && exists {
            config = config.with_source(&id, current.with_data_path(&path));
            changed = true;
        }
    }

    if config.sqlite_executor.is_none() {
        if let Some(sqlite) = find_on_path("sqlite3") {
            println!("{:<18} {}", "sqlite_executor", sqlite.display());
            if write {
                config.sqlite_executor = Some(sqlite);
                changed = true;
            }
        }
    }

    if changed {
        config::save(&config)?;
        println!("{PREFIX} wrote suggestions to {}", config.config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_cli_args, render_line, Command};
    use crate::model::{CanonicalItem, IconRef, LaunchCommand};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_search_with_global_config() {
        let cli = parse_cli_args(&args(&["search", "report", "--limit", "5", "--config", "/tmp/c.toml"]))
            .unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/c.toml")));
        assert_eq!(
            cli.command,
            Command::Search {
                query: "report".into(),
                limit: 5,
                json: false
            }
        );
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(parse_cli_args(&args(&["launch"])).is_err());
    }

    #[test]
    fn renders_missing_marker_and_launch() {
        let item = CanonicalItem::new(
            "idea",
            "app",
            "/work/app",
            IconRef::default(),
            LaunchCommand::shell("idea", ["/work/app"]),
        )
        .with_exists(false);
        let line = render_line(&item);
        assert!(line.starts_with("[idea] app (missing)"));
        assert!(line.ends_with("\"idea\" \"/work/app\""));
    }
}
