use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use recentfind_core::config::EngineConfig;
use recentfind_core::error::SourceError;
use recentfind_core::ide_history::{self, expand_home, parse_recent_projects, RecentProject};
use recentfind_core::model::LaunchCommand;
use recentfind_core::settings::SourceConfig;
use recentfind_core::source::{BundledIcons, ExtractContext, SourceAdapter};

const RECENT_PROJECTS: &str = r#"<application>
  <component name="RecentProjectsManager">
    <option name="additionalInfo">
      <map>
        <entry key="$USER_HOME$/work/alpha">
          <value>
            <RecentProjectMetaInfo frameTitle="alpha">
              <option name="build" value="IU-241.1" />
              <option name="projectOpenTimestamp" value="1700000000123" />
            </RecentProjectMetaInfo>
          </value>
        </entry>
        <entry key="/opt/beta">
          <value>
            <RecentProjectMetaInfo>
              <option name="projectOpenTimestamp" value="not-a-number" />
            </RecentProjectMetaInfo>
          </value>
        </entry>
        <entry key="/opt/gamma" />
        <entry key="" />
      </map>
    </option>
    <option name="lastOpenedProject" value="/opt/ignored" />
  </component>
</application>"#;

fn temp_dir(label: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("recentfind-ide-{label}-{unique}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn parses_entries_with_and_without_timestamps() {
    let projects = parse_recent_projects(RECENT_PROJECTS).unwrap();
    assert_eq!(
        projects,
        vec![
            RecentProject {
                path: "$USER_HOME$/work/alpha".into(),
                opened_at_ms: 1_700_000_000_123,
            },
            RecentProject {
                path: "/opt/beta".into(),
                opened_at_ms: 0,
            },
            RecentProject {
                path: "/opt/gamma".into(),
                opened_at_ms: 0,
            },
        ]
    );
}

#[test]
fn entries_outside_additional_info_are_ignored() {
    let xml = r#"<application>
      <component name="RecentProjectsManager">
        <option name="groups">
          <map><entry key="/opt/grouped" /></map>
        </option>
      </component>
    </application>"#;
    assert!(parse_recent_projects(xml).unwrap().is_empty());
}

#[test]
fn malformed_xml_is_a_parse_error() {
    let error = parse_recent_projects("<application><option name=\"additionalInfo\"></application>")
        .unwrap_err();
    assert!(matches!(error, SourceError::ParseFailure { .. }));
}

#[test]
fn home_placeholder_expands_to_the_home_dir() {
    let expanded = expand_home("$USER_HOME$/work/alpha", std::path::Path::new("/home/me"));
    assert_eq!(expanded, "/home/me/work/alpha");
    assert_eq!(expand_home("/opt/beta", std::path::Path::new("/home/me")), "/opt/beta");
}

#[test]
fn adapter_extracts_projects_from_the_configured_file() {
    let dir = temp_dir("extract");
    let home = dir.join("home");
    std::fs::create_dir_all(home.join("work").join("alpha")).unwrap();
    let file = dir.join("recentProjects.xml");
    std::fs::write(&file, RECENT_PROJECTS).unwrap();

    let adapter = ide_history::adapters()
        .into_iter()
        .find(|adapter| adapter.descriptor().id == "idea")
        .unwrap();
    let config = EngineConfig::default();
    let ctx = ExtractContext::from_config(&config, &BundledIcons).with_home_dir(&home);
    let items = adapter
        .extract(&ctx, &SourceConfig::default().with_data_path(&file))
        .unwrap();

    assert_eq!(items.len(), 3);
    let alpha = &items[0];
    let alpha_path = format!("{}/work/alpha", home.to_string_lossy());
    assert_eq!(alpha.title, "alpha");
    assert_eq!(alpha.description, alpha_path);
    assert_eq!(alpha.sort_key, 1_700_000_000);
    assert!(alpha.exists);
    assert_eq!(alpha.launch, LaunchCommand::shell("idea", [alpha_path.as_str()]));
    assert_eq!(alpha.icon.as_str(), "icon/jetbrains-idea.png");

    let beta = &items[1];
    assert_eq!(beta.title, "beta");
    assert_eq!(beta.sort_key, 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_is_unavailable() {
    let adapter = ide_history::adapters()
        .into_iter()
        .find(|adapter| adapter.descriptor().id == "goland")
        .unwrap();
    let config = EngineConfig::default();
    let ctx = ExtractContext::from_config(&config, &BundledIcons);
    let missing = std::env::temp_dir().join("recentfind-ide-missing/recentProjects.xml");
    assert!(adapter
        .extract(&ctx, &SourceConfig::default().with_data_path(&missing))
        .is_err());
}
