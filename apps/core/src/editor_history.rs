use std::path::Path;
use std::time::UNIX_EPOCH;

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use url::Url;

use crate::config_state::Requirements;
use crate::error::SourceError;
use crate::model::{CanonicalItem, LaunchCommand};
use crate::search_index::SearchIndexBuilder;
use crate::settings::SourceConfig;
use crate::source::{
    query_source, require_data_path, ExtractContext, IconResolver, SourceAdapter,
    SourceDescriptor, SourceGroup,
};

const RECENT_PATHS_SQL: &str =
    "select value from ItemTable where key = 'history.recentlyOpenedPathsList'";
const REMOTE_SCHEME_PREFIX: &str = "vscode-remote";
const WORKSPACE_EXTENSION: &str = ".code-workspace";
const WORKTREE_MARKER: &str = ".worktrees";

const FILE_TAG: &str = " (File)";
const WORKSPACE_TAG: &str = " (Workspace)";
const WORKTREE_TAG: &str = "(Worktree)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorFormat {
    StorageJson,
    StateDb,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentEntry {
    #[serde(rename = "folderUri", default)]
    pub folder_uri: Option<String>,
    #[serde(rename = "fileUri", default)]
    pub file_uri: Option<String>,
    #[serde(default)]
    pub workspace: Option<WorkspaceRef>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceRef {
    #[serde(rename = "configPath", default)]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentList {
    #[serde(default)]
    pub entries: Vec<RecentEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StorageDocument {
    #[serde(rename = "openedPathsList", default)]
    opened_paths_list: Option<RecentList>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EntryOptions<'a> {
    pub launcher: &'a str,
    pub open_in_new_window: bool,
    pub sort_by_access_time: bool,
    pub windows_paths: bool,
}

pub struct EditorHistorySource {
    descriptor: SourceDescriptor,
    format: EditorFormat,
}

impl EditorHistorySource {
    pub fn new(descriptor: SourceDescriptor, format: EditorFormat) -> Self {
        Self { descriptor, format }
    }

    fn load_entries(
        &self,
        ctx: &ExtractContext<'_>,
        config: &SourceConfig,
    ) -> Result<Vec<RecentEntry>, SourceError> {
        match self.format {
            EditorFormat::StorageJson => {
                let path = require_data_path(config)?;
                let raw = std::fs::read_to_string(&path)?;
                let document: StorageDocument = serde_json::from_str(&raw)?;
                Ok(document
                    .opened_paths_list
                    .map(|list| list.entries)
                    .unwrap_or_default())
            }
            EditorFormat::StateDb => {
                let output = query_source(ctx, &self.descriptor, config, RECENT_PATHS_SQL)?;
                let value = output.trim();
                if value.is_empty() {
                    return Ok(Vec::new());
                }
                let list: RecentList = serde_json::from_str(value)?;
                Ok(list.entries)
            }
        }
    }
}

impl SourceAdapter for EditorHistorySource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn extract(
        &self,
        ctx: &ExtractContext<'_>,
        config: &SourceConfig,
    ) -> Result<Vec<CanonicalItem>, SourceError> {
        let entries = self.load_entries(ctx, config)?;
        let launcher = self.descriptor.launcher(config);
        let options = EntryOptions {
            launcher: &launcher,
            open_in_new_window: config.open_in_new_window,
            sort_by_access_time: config.sort_by_access_time,
            windows_paths: cfg!(windows),
        };
        Ok(parse_entries(&self.descriptor, &entries, options, ctx.icons))
    }
}

pub fn parse_entries(
    source: &SourceDescriptor,
    entries: &[RecentEntry],
    options: EntryOptions<'_>,
    icons: &dyn IconResolver,
) -> Vec<CanonicalItem> {
    let workspace_configs: Vec<&str> = entries
        .iter()
        .filter_map(|entry| entry.workspace.as_ref()?.config_path.as_deref())
        .filter(|config_path| !config_path.is_empty())
        .collect();

    entries
        .iter()
        .filter_map(|entry| {
            let (uri, tag) = classify(entry)?;
            if entry.folder_uri.as_deref() == Some(uri)
                && workspace_configs
                    .iter()
                    .any(|config_path| workspace_covers_folder(config_path, uri))
            {
                return None;
            }
            Some(to_item(source, entry, uri, &tag, options, icons))
        })
        .collect()
}

fn classify(entry: &RecentEntry) -> Option<(&str, String)> {
    if let Some(folder) = non_empty(entry.folder_uri.as_deref()) {
        return Some((folder, String::new()));
    }
    if let Some(file) = non_empty(entry.file_uri.as_deref()) {
        return Some((file, FILE_TAG.to_string()));
    }
    let config_path = non_empty(entry.workspace.as_ref()?.config_path.as_deref())?;
    let mut tag = WORKSPACE_TAG.to_string();
    if config_path.contains(WORKTREE_MARKER) {
        tag.push_str(WORKTREE_TAG);
    }
    Some((config_path, tag))
}

// A workspace file stored directly inside a folder takes that folder's place.
pub fn workspace_covers_folder(config_path: &str, folder_uri: &str) -> bool {
    if !config_path.ends_with(WORKSPACE_EXTENSION) {
        return false;
    }
    config_path
        .rsplit_once('/')
        .is_some_and(|(parent, _)| parent == folder_uri.trim_end_matches('/'))
}

fn to_item(
    source: &SourceDescriptor,
    entry: &RecentEntry,
    uri: &str,
    tag: &str,
    options: EntryOptions<'_>,
    icons: &dyn IconResolver,
) -> CanonicalItem {
    let decoded = percent_decode_str(uri).decode_utf8_lossy().into_owned();
    let path = uri_to_path(uri, options.windows_paths);
    let name = Path::new(&path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| path.clone());
    let title = format!("{name}{tag}");
    let keys = SearchIndexBuilder::new(&name).path(&path).build();

    let (exists, description, launch) = if uri.starts_with(REMOTE_SCHEME_PREFIX) {
        let label = non_empty(entry.label.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| decoded.clone());
        let launch = LaunchCommand::shell(options.launcher, ["--folder-uri".to_string(), decoded]);
        (true, label, launch)
    } else {
        let mut args = Vec::new();
        if options.open_in_new_window {
            args.push("-n".to_string());
        }
        args.push(path.clone());
        (
            Path::new(&path).exists(),
            path.clone(),
            LaunchCommand::shell(options.launcher, args),
        )
    };

    let sort_key = if options.sort_by_access_time && exists {
        access_time_secs(Path::new(&path))
    } else {
        0
    };

    CanonicalItem::new(
        &source.id,
        &title,
        &description,
        icons.for_path(source, Path::new(&path)),
        launch,
    )
    .with_search_keys(keys)
    .with_sort_key(sort_key)
    .with_exists(exists)
}

pub fn uri_to_path(uri: &str, windows_paths: bool) -> String {
    let encoded_path = match Url::parse(uri) {
        Ok(url) => url.path().to_string(),
        Err(_) => uri.to_string(),
    };
    let path = percent_decode_str(&encoded_path)
        .decode_utf8_lossy()
        .into_owned();
    if windows_paths && has_drive_prefix(&path) {
        path[1..].to_string()
    } else {
        path
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b':'
}

fn access_time_secs(path: &Path) -> i64 {
    let accessed = std::fs::metadata(path).and_then(|metadata| metadata.accessed());
    match accessed {
        Ok(time) => time
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or(0),
        Err(error) => {
            log::debug!("access time unavailable for {}: {error}", path.display());
            0
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

pub fn adapters() -> Vec<Box<dyn SourceAdapter>> {
    let editors: [(&str, &str, &str, &str, EditorFormat); 4] = [
        ("vscode", "Visual Studio Code", "code", "ms-visual-studio-code", EditorFormat::StateDb),
        ("windsurf", "Windsurf", "windsurf", "windsurf", EditorFormat::StateDb),
        ("trae", "Trae", "trae", "trae", EditorFormat::StateDb),
        (
            "vscode-legacy",
            "Visual Studio Code (< 1.64.0)",
            "code",
            "ms-visual-studio-code",
            EditorFormat::StorageJson,
        ),
    ];

    editors
        .into_iter()
        .map(|(id, name, launcher, icon, format)| {
            let (requirements, file_name) = match format {
                EditorFormat::StateDb => (Requirements::SQLITE, "state.vscdb"),
                EditorFormat::StorageJson => (Requirements::FILE_ONLY, "storage.json"),
            };
            let descriptor = SourceDescriptor::new(id, name, SourceGroup::Editor, requirements)
                .with_icon(&format!("icon/{icon}.png"))
                .with_default_launcher(launcher)
                .with_config_file_name(file_name);
            Box::new(EditorHistorySource::new(descriptor, format)) as Box<dyn SourceAdapter>
        })
        .collect()
}
