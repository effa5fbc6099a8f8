use serde::{Deserialize, Serialize};

use crate::config_state::ReadinessState;
use crate::core_service::SourceStatus;
use crate::model::{CanonicalItem, LaunchCommand};
use crate::source::SourceGroup;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogRequest {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LaunchDto {
    Shell { program: String, args: Vec<String> },
    Handler { uri: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemDto {
    pub source_id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub search_keys: Vec<String>,
    pub sort_key: i64,
    pub exists: bool,
    pub launch: LaunchDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemsResponse {
    pub items: Vec<ItemDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceStatusDto {
    pub id: String,
    pub name: String,
    pub group: SourceGroup,
    pub state: ReadinessState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub sources: Vec<SourceStatusDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreRequest {
    Catalog(CatalogRequest),
    Search(SearchRequest),
    Source(SourceRequest),
    Status,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreResponse {
    Catalog(ItemsResponse),
    Search(ItemsResponse),
    Source(ItemsResponse),
    Status(StatusResponse),
}

impl From<LaunchCommand> for LaunchDto {
    fn from(value: LaunchCommand) -> Self {
        match value {
            LaunchCommand::Shell { program, args } => Self::Shell { program, args },
            LaunchCommand::Handler { uri } => Self::Handler { uri },
        }
    }
}

impl From<CanonicalItem> for ItemDto {
    fn from(value: CanonicalItem) -> Self {
        Self {
            source_id: value.source_id,
            title: value.title,
            description: value.description,
            icon: value.icon.as_str().to_string(),
            search_keys: value.search_keys.into_vec(),
            sort_key: value.sort_key,
            exists: value.exists,
            launch: value.launch.into(),
        }
    }
}

impl From<SourceStatus> for SourceStatusDto {
    fn from(value: SourceStatus) -> Self {
        Self {
            id: value.id,
            name: value.name,
            group: value.group,
            state: value.state,
        }
    }
}

impl ItemsResponse {
    pub fn from_items(items: Vec<CanonicalItem>) -> Self {
        Self {
            items: items.into_iter().map(ItemDto::from).collect(),
        }
    }
}
