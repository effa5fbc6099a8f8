use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::ide_history::{IdeProduct, PRODUCTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDirs {
    pub home: PathBuf,
    pub config: PathBuf,
    pub local_data: PathBuf,
}

impl UserDirs {
    pub fn detect() -> Option<Self> {
        Some(Self {
            home: dirs::home_dir()?,
            config: dirs::config_dir()?,
            local_data: dirs::data_local_dir()?,
        })
    }

    pub fn under_home(home: impl Into<PathBuf>, platform: Platform) -> Self {
        let home = home.into();
        let (config, local_data) = match platform {
            Platform::MacOs => {
                let support = home.join("Library").join("Application Support");
                (support.clone(), support)
            }
            Platform::Windows => (
                home.join("AppData").join("Roaming"),
                home.join("AppData").join("Local"),
            ),
            Platform::Linux => (home.join(".config"), home.join(".local").join("share")),
        };
        Self {
            home,
            config,
            local_data,
        }
    }
}

pub fn suggest_data_path(source_id: &str, dirs: &UserDirs, platform: Platform) -> Option<PathBuf> {
    if let Some(product) = PRODUCTS.iter().find(|product| product.id == source_id) {
        return jetbrains_recent_file(product, dirs);
    }

    match source_id {
        "safari-history" => {
            (platform == Platform::MacOs).then(|| dirs.home.join("Library/Safari/History.db"))
        }
        "chrome-history" => Some(chromium_history(dirs, platform, CHROME_DIRS)),
        "edge-history" => Some(chromium_history(dirs, platform, EDGE_DIRS)),
        "firefox-history" => firefox_places(dirs, platform),
        "vscode" => Some(editor_state_db(dirs, "Code")),
        "windsurf" => Some(editor_state_db(dirs, "Windsurf")),
        "trae" => Some(editor_state_db(dirs, "Trae")),
        "vscode-legacy" => Some(dirs.config.join("Code").join("storage.json")),
        "evernote-mac" => newest_file(
            &dirs.config.join("com.yinxiang.Mac").join("accounts"),
            4,
            |entry| file_name_is(entry, "LocalNoteStore.sqlite"),
        ),
        "evernote-win" => newest_file(&dirs.home.join("Yinxiang Biji").join("Databases"), 1, |entry| {
            entry.path().extension().is_some_and(|ext| ext == "exb")
        }),
        _ => None,
    }
}

pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| executable_names(program).map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

fn executable_names(program: &str) -> impl Iterator<Item = String> {
    let windows_name = cfg!(windows).then(|| format!("{program}.exe"));
    windows_name.into_iter().chain(std::iter::once(program.to_string()))
}

struct ChromiumDirs {
    mac: &'static str,
    windows: &'static str,
    linux: &'static str,
}

const CHROME_DIRS: ChromiumDirs = ChromiumDirs {
    mac: "Google/Chrome",
    windows: "Google/Chrome/User Data",
    linux: "google-chrome",
};

const EDGE_DIRS: ChromiumDirs = ChromiumDirs {
    mac: "Microsoft Edge",
    windows: "Microsoft/Edge/User Data",
    linux: "microsoft-edge",
};

fn chromium_history(dirs: &UserDirs, platform: Platform, layout: ChromiumDirs) -> PathBuf {
    let profile_root = match platform {
        Platform::MacOs => dirs.config.join(layout.mac),
        Platform::Windows => dirs.local_data.join(layout.windows),
        Platform::Linux => dirs.config.join(layout.linux),
    };
    profile_root.join("Default").join("History")
}

fn firefox_places(dirs: &UserDirs, platform: Platform) -> Option<PathBuf> {
    let profiles = match platform {
        Platform::MacOs => dirs.config.join("Firefox").join("Profiles"),
        Platform::Windows => dirs.config.join("Mozilla").join("Firefox").join("Profiles"),
        Platform::Linux => dirs.home.join(".mozilla").join("firefox"),
    };
    newest_file(&profiles, 2, |entry| file_name_is(entry, "places.sqlite"))
}

fn editor_state_db(dirs: &UserDirs, product_dir: &str) -> PathBuf {
    dirs.config
        .join(product_dir)
        .join("User")
        .join("globalStorage")
        .join("state.vscdb")
}

fn jetbrains_recent_file(product: &IdeProduct, dirs: &UserDirs) -> Option<PathBuf> {
    newest_file(&dirs.config.join(product.vendor_dir), 3, |entry| {
        if !file_name_is(entry, product.file_name) {
            return false;
        }
        let Some(options_dir) = entry.path().parent() else {
            return false;
        };
        if !options_dir.file_name().is_some_and(|name| name == "options") {
            return false;
        }
        options_dir
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|name| product.matches_config_dir(&name.to_string_lossy()))
    })
}

fn file_name_is(entry: &DirEntry, name: &str) -> bool {
    entry.file_type().is_file() && entry.file_name() == name
}

fn newest_file(root: &Path, max_depth: usize, accept: impl Fn(&DirEntry) -> bool) -> Option<PathBuf> {
    if !root.is_dir() {
        return None;
    }
    WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| accept(entry))
        .filter_map(|entry| {
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((modified, entry.into_path()))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}
