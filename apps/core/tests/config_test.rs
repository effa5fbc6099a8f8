use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use recentfind_core::config::{self, EngineConfig};
use recentfind_core::settings::{SettingsStore, SourceConfig};

fn temp_config_path(label: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir()
        .join(format!("recentfind-config-{label}-{unique}"))
        .join("config.toml")
}

#[test]
fn rejects_history_limit_outside_presets() {
    let cfg = EngineConfig {
        history_limit: 150,
        ..Default::default()
    };
    assert!(config::validate(&cfg).is_err());
}

#[test]
fn accepts_default_config() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.history_limit, 100);
    assert!(cfg.parallel_extraction);
    assert!(cfg.config_path.to_string_lossy().contains("recentfind"));
    assert!(config::validate(&cfg).is_ok());
}

#[test]
fn rejects_unknown_log_level_and_tiny_output_cap() {
    let noisy = EngineConfig {
        log_level: "chatty".into(),
        ..Default::default()
    };
    assert!(config::validate(&noisy).is_err());

    let tiny = EngineConfig {
        max_query_output_bytes: 16,
        ..Default::default()
    };
    assert!(config::validate(&tiny).is_err());
}

#[test]
fn missing_file_loads_defaults_at_that_path() {
    let path = temp_config_path("missing");
    let cfg = config::load(Some(&path)).unwrap();
    assert_eq!(cfg.config_path, path);
    assert_eq!(cfg.history_limit, 100);
    assert!(cfg.sources.is_empty());
}

#[test]
fn loads_source_tables_from_toml() {
    let path = temp_config_path("toml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        r#"
history_limit = 200
query_timeout_ms = 2500
sqlite_executor = "/usr/bin/sqlite3"

[sources.chrome-history]
data_path = "/home/me/.config/google-chrome/Default/History"

[sources.vscode]
enabled = false
open_in_new_window = true
"#,
    )
    .unwrap();

    let cfg = config::load(Some(&path)).unwrap();
    assert_eq!(cfg.history_limit, 200);
    assert_eq!(cfg.query_options().timeout, Duration::from_millis(2500));
    assert_eq!(cfg.sqlite_executor, Some(PathBuf::from("/usr/bin/sqlite3")));

    let chrome = cfg.source_config("chrome-history");
    assert!(chrome.enabled);
    assert_eq!(
        chrome.data_path(),
        Some(PathBuf::from("/home/me/.config/google-chrome/Default/History"))
    );
    let vscode = cfg.source_config("vscode");
    assert!(!vscode.enabled);
    assert!(vscode.open_in_new_window);
    assert_eq!(cfg.source_config("firefox-history"), SourceConfig::default());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn invalid_file_is_rejected() {
    let path = temp_config_path("invalid");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "history_limit = 7\n").unwrap();
    assert!(config::load(Some(&path)).is_err());

    std::fs::write(&path, "history_limit = [").unwrap();
    assert!(config::load(Some(&path)).is_err());
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn save_then_load_keeps_source_settings() {
    let path = temp_config_path("save");
    let cfg = EngineConfig {
        config_path: path.clone(),
        history_limit: 500,
        ..Default::default()
    }
    .with_source(
        "evernote-win",
        SourceConfig::default()
            .with_data_path("/data/app.yinxiang.com.exb")
            .with_account("9876"),
    );

    config::save(&cfg).unwrap();
    let loaded = config::load(Some(&path)).unwrap();
    assert_eq!(loaded, cfg);
    assert_eq!(loaded.source_config("evernote-win").account(), Some("9876"));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
