use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::settings::SourceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    Empty,
    Undone,
    Error,
    Done,
}

impl ReadinessState {
    pub fn is_ready(self) -> bool {
        self == Self::Done
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Requirements {
    pub executor: bool,
    pub account: bool,
}

impl Requirements {
    pub const FILE_ONLY: Self = Self {
        executor: false,
        account: false,
    };
    pub const SQLITE: Self = Self {
        executor: true,
        account: false,
    };
    pub const SQLITE_WITH_ACCOUNT: Self = Self {
        executor: true,
        account: true,
    };
}

// `fallback_executor` is the globally configured query tool used when the source has no
// executor of its own. It only matters for sources that require an executor.
pub fn evaluate(
    requirements: Requirements,
    config: &SourceConfig,
    fallback_executor: Option<&Path>,
) -> ReadinessState {
    if !config.enabled {
        return ReadinessState::Empty;
    }

    let data_path = config.data_path();
    let own_executor = if requirements.executor {
        config.executor_path()
    } else {
        None
    };
    let launcher = config.launcher_path();
    let account = requirements.account && config.account().is_some();

    if data_path.is_none() && own_executor.is_none() && launcher.is_none() && !account {
        return ReadinessState::Empty;
    }

    let used_fallback = if requirements.executor && own_executor.is_none() {
        fallback_executor
            .filter(|path| !path.as_os_str().is_empty())
            .map(Path::to_path_buf)
    } else {
        None
    };

    let configured: [&Option<PathBuf>; 4] = [&data_path, &own_executor, &launcher, &used_fallback];
    if configured
        .iter()
        .filter_map(|path| path.as_deref())
        .any(|path| !path.exists())
    {
        return ReadinessState::Error;
    }

    if data_path.is_none() {
        return ReadinessState::Undone;
    }
    if requirements.executor && own_executor.is_none() && used_fallback.is_none() {
        return ReadinessState::Undone;
    }
    if requirements.account && config.account().is_none() {
        return ReadinessState::Undone;
    }

    ReadinessState::Done
}

pub fn missing_path(config: &SourceConfig) -> Option<PathBuf> {
    [
        config.data_path(),
        config.executor_path(),
        config.launcher_path(),
    ]
    .into_iter()
    .flatten()
    .find(|path| !path.exists())
}
