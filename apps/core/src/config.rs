use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::{validate_history_limit, SettingsStore, SourceConfig};
use crate::sqlite_cli::{QueryOptions, DEFAULT_MAX_OUTPUT_BYTES};

const APP_DIR_NAME: &str = "recentfind";
const CONFIG_FILE_NAME: &str = "config.toml";
const MIN_QUERY_OUTPUT_BYTES: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config toml: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub history_limit: u32,
    pub query_timeout_ms: u64,
    pub max_query_output_bytes: usize,
    pub sqlite_executor: Option<PathBuf>,
    pub scratch_dir: PathBuf,
    pub parallel_extraction: bool,
    pub log_level: String,
    pub sources: BTreeMap<String, SourceConfig>,
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            query_timeout_ms: 5_000,
            max_query_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            sqlite_executor: None,
            scratch_dir: std::env::temp_dir().join(APP_DIR_NAME).join("scratch"),
            parallel_extraction: true,
            log_level: "info".to_string(),
            sources: BTreeMap::new(),
            config_path: stable_app_data_dir().join(CONFIG_FILE_NAME),
        }
    }
}

impl EngineConfig {
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            timeout: Duration::from_millis(self.query_timeout_ms),
            max_output_bytes: self.max_query_output_bytes,
        }
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level
            .trim()
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }

    pub fn with_source(mut self, source_id: &str, config: SourceConfig) -> Self {
        self.sources.insert(source_id.to_string(), config);
        self
    }
}

impl SettingsStore for EngineConfig {
    fn source_config(&self, source_id: &str) -> SourceConfig {
        self.sources.get(source_id).cloned().unwrap_or_default()
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn validate(cfg: &EngineConfig) -> Result<(), ConfigError> {
    validate_history_limit(cfg.history_limit).map_err(ConfigError::Invalid)?;

    if !(100..=60_000).contains(&cfg.query_timeout_ms) {
        return Err(ConfigError::Invalid(
            "query_timeout_ms must be between 100 and 60000".into(),
        ));
    }

    if cfg.max_query_output_bytes < MIN_QUERY_OUTPUT_BYTES {
        return Err(ConfigError::Invalid(format!(
            "max_query_output_bytes must be at least {MIN_QUERY_OUTPUT_BYTES}"
        )));
    }

    if cfg.scratch_dir.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("scratch_dir is required".into()));
    }

    if cfg.log_level.trim().parse::<log::LevelFilter>().is_err() {
        return Err(ConfigError::Invalid(format!(
            "unknown log_level '{}'",
            cfg.log_level
        )));
    }

    Ok(())
}

pub fn load(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| stable_app_data_dir().join(CONFIG_FILE_NAME));

    if !config_path.exists() {
        return Ok(EngineConfig {
            config_path,
            ..EngineConfig::default()
        });
    }

    let raw = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;
    let mut cfg: EngineConfig = toml::from_str(&raw)?;
    cfg.config_path = config_path;
    validate(&cfg)?;
    Ok(cfg)
}

pub fn save(cfg: &EngineConfig) -> Result<(), ConfigError> {
    validate(cfg)?;
    if let Some(parent) = cfg.config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let encoded = toml::to_string_pretty(cfg)?;
    std::fs::write(&cfg.config_path, encoded).map_err(|source| ConfigError::Io {
        path: cfg.config_path.clone(),
        source,
    })
}
