use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::config_state::{self, ReadinessState, Requirements};
use crate::error::SourceError;
use crate::model::{CanonicalItem, IconRef};
use crate::settings::SourceConfig;
use crate::sqlite_cli::{self, CancelToken, QueryOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceGroup {
    BrowserHistory,
    Editor,
    Ide,
    Notes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub id: String,
    pub name: String,
    pub group: SourceGroup,
    pub icon: IconRef,
    pub requirements: Requirements,
    pub default_launcher: Option<String>,
    pub config_file_name: String,
}

impl SourceDescriptor {
    pub fn new(id: &str, name: &str, group: SourceGroup, requirements: Requirements) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            group,
            icon: IconRef::new(format!("icon/{id}.png")),
            requirements,
            default_launcher: None,
            config_file_name: String::new(),
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = IconRef::new(icon);
        self
    }

    pub fn with_default_launcher(mut self, launcher: &str) -> Self {
        self.default_launcher = Some(launcher.to_string());
        self
    }

    pub fn with_config_file_name(mut self, file_name: &str) -> Self {
        self.config_file_name = file_name.to_string();
        self
    }

    pub fn readiness(&self, config: &SourceConfig, fallback_executor: Option<&Path>) -> ReadinessState {
        config_state::evaluate(self.requirements, config, fallback_executor)
    }

    pub fn launcher(&self, config: &SourceConfig) -> String {
        config
            .launcher_path()
            .map(|path| path.to_string_lossy().into_owned())
            .or_else(|| self.default_launcher.clone())
            .unwrap_or_default()
    }
}

pub trait IconResolver: Send + Sync {
    fn for_url(&self, source: &SourceDescriptor, url: &str) -> IconRef;
    fn for_path(&self, source: &SourceDescriptor, path: &Path) -> IconRef;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BundledIcons;

impl IconResolver for BundledIcons {
    fn for_url(&self, source: &SourceDescriptor, _url: &str) -> IconRef {
        source.icon.clone()
    }

    fn for_path(&self, source: &SourceDescriptor, _path: &Path) -> IconRef {
        source.icon.clone()
    }
}

#[derive(Clone)]
pub struct ExtractContext<'a> {
    pub history_limit: u32,
    pub query: QueryOptions,
    pub scratch_dir: PathBuf,
    pub fallback_executor: Option<PathBuf>,
    pub home_dir: PathBuf,
    pub icons: &'a dyn IconResolver,
    pub cancel: CancelToken,
}

impl<'a> ExtractContext<'a> {
    pub fn from_config(cfg: &EngineConfig, icons: &'a dyn IconResolver) -> Self {
        Self {
            history_limit: cfg.history_limit,
            query: cfg.query_options(),
            scratch_dir: cfg.scratch_dir.clone(),
            fallback_executor: cfg.sqlite_executor.clone(),
            home_dir: dirs::home_dir().unwrap_or_default(),
            icons,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_home_dir(mut self, home_dir: impl Into<PathBuf>) -> Self {
        self.home_dir = home_dir.into();
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

pub trait SourceAdapter: Send + Sync {
    fn descriptor(&self) -> &SourceDescriptor;

    fn extract(
        &self,
        ctx: &ExtractContext<'_>,
        config: &SourceConfig,
    ) -> Result<Vec<CanonicalItem>, SourceError>;
}

pub fn extract_or_empty(
    adapter: &dyn SourceAdapter,
    ctx: &ExtractContext<'_>,
    config: &SourceConfig,
) -> Vec<CanonicalItem> {
    let id = &adapter.descriptor().id;
    match adapter.extract(ctx, config) {
        Ok(mut items) => {
            sort_by_recency(&mut items);
            log::debug!("source {id} produced {} items", items.len());
            items
        }
        Err(error @ SourceError::SourceUnavailable(_)) => {
            log::debug!("source {id} skipped: {error}");
            Vec::new()
        }
        Err(error) if error.is_cancelled() => {
            log::debug!("source {id} cancelled");
            Vec::new()
        }
        Err(error) => {
            log::warn!("source {id} failed: {error}");
            Vec::new()
        }
    }
}

pub fn extract_checked(
    adapter: &dyn SourceAdapter,
    ctx: &ExtractContext<'_>,
    config: &SourceConfig,
) -> Result<Vec<CanonicalItem>, SourceError> {
    let descriptor = adapter.descriptor();
    let state = descriptor.readiness(config, ctx.fallback_executor.as_deref());
    if state == ReadinessState::Error {
        if let Some(path) = config_state::missing_path(config) {
            return Err(SourceError::ConfigInvalid(path));
        }
    }
    if !state.is_ready() {
        return Err(SourceError::NotReady {
            id: descriptor.id.clone(),
            state,
        });
    }
    let mut items = adapter.extract(ctx, config)?;
    sort_by_recency(&mut items);
    Ok(items)
}

// Stable: equal keys keep their relative order.
pub fn sort_by_recency(items: &mut [CanonicalItem]) {
    items.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
}

pub fn builtin_sources() -> Vec<Box<dyn SourceAdapter>> {
    let mut sources: Vec<Box<dyn SourceAdapter>> = Vec::new();
    sources.extend(crate::browser_history::adapters());
    sources.extend(crate::editor_history::adapters());
    sources.extend(crate::ide_history::adapters());
    sources.extend(crate::notes::adapters());
    sources
}

pub struct StaticSource {
    descriptor: SourceDescriptor,
    items: Vec<CanonicalItem>,
}

impl StaticSource {
    pub fn new(descriptor: SourceDescriptor, items: Vec<CanonicalItem>) -> Self {
        Self { descriptor, items }
    }
}

impl SourceAdapter for StaticSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn extract(
        &self,
        _ctx: &ExtractContext<'_>,
        _config: &SourceConfig,
    ) -> Result<Vec<CanonicalItem>, SourceError> {
        Ok(self.items.clone())
    }
}

pub(crate) fn require_data_path(config: &SourceConfig) -> Result<PathBuf, SourceError> {
    let path = config
        .data_path()
        .ok_or_else(|| SourceError::unavailable("no data path configured"))?;
    if !path.is_file() {
        return Err(SourceError::unavailable(format!(
            "{} does not exist",
            path.display()
        )));
    }
    Ok(path)
}

pub(crate) fn resolve_executor(
    ctx: &ExtractContext<'_>,
    config: &SourceConfig,
) -> Result<PathBuf, SourceError> {
    config
        .executor_path()
        .or_else(|| ctx.fallback_executor.clone())
        .filter(|path| !path.as_os_str().is_empty())
        .ok_or_else(|| SourceError::unavailable("no sqlite executor configured"))
}

pub(crate) fn query_source(
    ctx: &ExtractContext<'_>,
    descriptor: &SourceDescriptor,
    config: &SourceConfig,
    sql: &str,
) -> Result<String, SourceError> {
    let database = require_data_path(config)?;
    let executor = resolve_executor(ctx, config)?;
    let output = sqlite_cli::query_snapshot(
        &executor,
        &database,
        &ctx.scratch_dir,
        &descriptor.id,
        sql,
        &ctx.query,
        &ctx.cancel,
    )?;
    Ok(output)
}
