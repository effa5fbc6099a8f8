use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const HISTORY_LIMIT_PRESETS: [u32; 4] = [100, 200, 500, 1000];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub enabled: bool,
    pub data_path: Option<String>,
    pub executor_path: Option<String>,
    pub launcher_path: Option<String>,
    pub account: Option<String>,
    pub open_in_new_window: bool,
    pub sort_by_access_time: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_path: None,
            executor_path: None,
            launcher_path: None,
            account: None,
            open_in_new_window: false,
            sort_by_access_time: false,
        }
    }
}

impl SourceConfig {
    pub fn with_data_path(mut self, path: impl AsRef<Path>) -> Self {
        self.data_path = Some(path.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn with_executor_path(mut self, path: impl AsRef<Path>) -> Self {
        self.executor_path = Some(path.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn with_launcher_path(mut self, path: impl AsRef<Path>) -> Self {
        self.launcher_path = Some(path.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn with_account(mut self, account: &str) -> Self {
        self.account = Some(account.to_string());
        self
    }

    pub fn data_path(&self) -> Option<PathBuf> {
        non_blank(self.data_path.as_deref()).map(PathBuf::from)
    }

    pub fn executor_path(&self) -> Option<PathBuf> {
        non_blank(self.executor_path.as_deref()).map(PathBuf::from)
    }

    pub fn launcher_path(&self) -> Option<PathBuf> {
        non_blank(self.launcher_path.as_deref()).map(PathBuf::from)
    }

    pub fn account(&self) -> Option<&str> {
        non_blank(self.account.as_deref())
    }
}

pub trait SettingsStore: Send + Sync {
    fn source_config(&self, source_id: &str) -> SourceConfig;
}

#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    configs: HashMap<String, SourceConfig>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source_id: &str, config: SourceConfig) -> Self {
        self.configs.insert(source_id.to_string(), config);
        self
    }
}

impl SettingsStore for MemorySettings {
    fn source_config(&self, source_id: &str) -> SourceConfig {
        self.configs.get(source_id).cloned().unwrap_or_default()
    }
}

pub fn validate_history_limit(value: u32) -> Result<(), String> {
    if HISTORY_LIMIT_PRESETS.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "History limit must be one of {}.",
            HISTORY_LIMIT_PRESETS
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
