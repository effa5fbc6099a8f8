use std::path::PathBuf;

use thiserror::Error;

use crate::config::{validate, ConfigError, EngineConfig};
use crate::config_state::ReadinessState;
use crate::contract::{CoreRequest, CoreResponse, ItemsResponse, StatusResponse};
use crate::error::SourceError;
use crate::model::CanonicalItem;
use crate::pipeline::{AggregationPipeline, Cancelled};
use crate::settings::{SettingsStore, SourceConfig};
use crate::source::{
    builtin_sources, extract_checked, BundledIcons, ExtractContext, IconResolver, SourceAdapter,
    SourceGroup,
};
use crate::sqlite_cli::CancelToken;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown source: {0}")]
    SourceNotFound(String),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub id: String,
    pub name: String,
    pub group: SourceGroup,
    pub state: ReadinessState,
}

pub struct CatalogService {
    config: EngineConfig,
    settings: Box<dyn SettingsStore>,
    icons: Box<dyn IconResolver>,
    sources: Vec<Box<dyn SourceAdapter>>,
    home_dir: Option<PathBuf>,
}

impl CatalogService {
    pub fn new(config: EngineConfig) -> Result<Self, ServiceError> {
        validate(&config)?;
        Ok(Self {
            settings: Box::new(config.clone()),
            config,
            icons: Box::new(BundledIcons),
            sources: builtin_sources(),
            home_dir: None,
        })
    }

    pub fn with_settings(mut self, settings: impl SettingsStore + 'static) -> Self {
        self.settings = Box::new(settings);
        self
    }

    pub fn with_icons(mut self, icons: impl IconResolver + 'static) -> Self {
        self.icons = Box::new(icons);
        self
    }

    pub fn with_sources(mut self, sources: Vec<Box<dyn SourceAdapter>>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_home_dir(mut self, home_dir: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home_dir.into());
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sources(&self) -> &[Box<dyn SourceAdapter>] {
        &self.sources
    }

    pub fn readiness(&self) -> Vec<SourceStatus> {
        self.sources
            .iter()
            .map(|source| {
                let descriptor = source.descriptor();
                let config = self.settings.source_config(&descriptor.id);
                SourceStatus {
                    id: descriptor.id.clone(),
                    name: descriptor.name.clone(),
                    group: descriptor.group,
                    state: descriptor.readiness(&config, self.config.sqlite_executor.as_deref()),
                }
            })
            .collect()
    }

    pub fn catalog(&self, limit: Option<usize>) -> Vec<CanonicalItem> {
        self.pipeline(CancelToken::new()).build(&self.configured_sources(), limit)
    }

    pub fn catalog_cancellable(
        &self,
        cancel: CancelToken,
        limit: Option<usize>,
    ) -> Result<Vec<CanonicalItem>, ServiceError> {
        Ok(self.pipeline(cancel).run(&self.configured_sources(), limit)?)
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<CanonicalItem>, ServiceError> {
        if query.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("query must not be empty".into()));
        }
        let items = self.catalog(None);
        Ok(crate::search::search(&items, query, limit))
    }

    pub fn extract_source(&self, source_id: &str) -> Result<Vec<CanonicalItem>, ServiceError> {
        let source = self
            .sources
            .iter()
            .find(|source| source.descriptor().id == source_id)
            .ok_or_else(|| ServiceError::SourceNotFound(source_id.to_string()))?;
        let config = self.settings.source_config(source_id);
        let ctx = self.context(CancelToken::new());
        Ok(extract_checked(source.as_ref(), &ctx, &config)?)
    }

    pub fn handle_command(&self, request: CoreRequest) -> Result<CoreResponse, ServiceError> {
        match request {
            CoreRequest::Catalog(payload) => Ok(CoreResponse::Catalog(ItemsResponse::from_items(
                self.catalog(payload.limit),
            ))),
            CoreRequest::Search(payload) => {
                let limit = payload.limit.unwrap_or(self.config.history_limit as usize);
                Ok(CoreResponse::Search(ItemsResponse::from_items(
                    self.search(&payload.query, limit)?,
                )))
            }
            CoreRequest::Source(payload) => {
                if payload.id.trim().is_empty() {
                    return Err(ServiceError::InvalidRequest("source id must not be empty".into()));
                }
                Ok(CoreResponse::Source(ItemsResponse::from_items(
                    self.extract_source(payload.id.trim())?,
                )))
            }
            CoreRequest::Status => Ok(CoreResponse::Status(StatusResponse {
                sources: self.readiness().into_iter().map(Into::into).collect(),
            })),
        }
    }

    fn configured_sources(&self) -> Vec<(&dyn SourceAdapter, SourceConfig)> {
        self.sources
            .iter()
            .map(|source| {
                let config = self.settings.source_config(&source.descriptor().id);
                (source.as_ref(), config)
            })
            .collect()
    }

    fn context(&self, cancel: CancelToken) -> ExtractContext<'_> {
        let ctx = ExtractContext::from_config(&self.config, self.icons.as_ref()).with_cancel(cancel);
        match &self.home_dir {
            Some(home_dir) => ctx.with_home_dir(home_dir.clone()),
            None => ctx,
        }
    }

    fn pipeline(&self, cancel: CancelToken) -> AggregationPipeline<'_> {
        AggregationPipeline::new(self.context(cancel)).with_parallel(self.config.parallel_extraction)
    }
}
