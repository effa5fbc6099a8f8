use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::config_state::Requirements;
use crate::error::SourceError;
use crate::model::{CanonicalItem, LaunchCommand};
use crate::search_index::SearchIndexBuilder;
use crate::settings::SourceConfig;
use crate::source::{require_data_path, ExtractContext, SourceAdapter, SourceDescriptor, SourceGroup};

pub const HOME_PLACEHOLDER: &str = "$USER_HOME$";

const ADDITIONAL_INFO: &str = "additionalInfo";
const OPEN_TIMESTAMP: &str = "projectOpenTimestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdeProduct {
    pub id: &'static str,
    pub name: &'static str,
    pub launcher: &'static str,
    pub vendor_dir: &'static str,
    pub dir_prefix: &'static str,
    pub file_name: &'static str,
}

const RECENT_PROJECTS: &str = "recentProjects.xml";

pub const PRODUCTS: [IdeProduct; 16] = [
    product("android", "Android Studio", "studio", "Google", "AndroidStudio"),
    product("appcode", "AppCode", "appcode", "JetBrains", "AppCode"),
    product("clion", "CLion", "clion", "JetBrains", "CLion"),
    product("datagrip", "DataGrip", "datagrip", "JetBrains", "DataGrip"),
    product("goland", "GoLand", "goland", "JetBrains", "GoLand"),
    product("idea", "IntelliJ IDEA Ultimate", "idea", "JetBrains", "IntelliJIdea"),
    product("idea-ce", "IntelliJ IDEA Community Edition", "idea", "JetBrains", "IdeaIC"),
    product("idea-edu", "IntelliJ IDEA Edu", "idea", "JetBrains", "IdeaIE"),
    product("mps", "MPS", "mps", "JetBrains", "MPS"),
    product("phpstorm", "PhpStorm", "phpstorm", "JetBrains", "PhpStorm"),
    product("pycharm", "PyCharm Professional", "pycharm", "JetBrains", "PyCharm"),
    product("pycharm-ce", "PyCharm Community", "pycharm", "JetBrains", "PyCharmCE"),
    product("pycharm-edu", "PyCharm Edu", "pycharm", "JetBrains", "PyCharmEdu"),
    IdeProduct {
        file_name: "recentSolutions.xml",
        ..product("rider", "Rider", "rider", "JetBrains", "Rider")
    },
    product("rubymine", "RubyMine", "rubymine", "JetBrains", "RubyMine"),
    product("webstorm", "WebStorm", "webstorm", "JetBrains", "WebStorm"),
];

const fn product(
    id: &'static str,
    name: &'static str,
    launcher: &'static str,
    vendor_dir: &'static str,
    dir_prefix: &'static str,
) -> IdeProduct {
    IdeProduct {
        id,
        name,
        launcher,
        vendor_dir,
        dir_prefix,
        file_name: RECENT_PROJECTS,
    }
}

impl IdeProduct {
    // `PyCharm2024.1` matches `PyCharm`; `PyCharmCE2024.1` does not.
    pub fn matches_config_dir(&self, dir_name: &str) -> bool {
        dir_name
            .strip_prefix(self.dir_prefix)
            .and_then(|version| version.chars().next())
            .is_some_and(|first| first.is_ascii_digit())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentProject {
    pub path: String,
    pub opened_at_ms: i64,
}

#[derive(Debug)]
struct Frame {
    name: String,
    option_name: Option<String>,
}

pub fn parse_recent_projects(xml: &str) -> Result<Vec<RecentProject>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut current: Option<(usize, RecentProject)> = None;
    let mut projects = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let frame = read_frame(&element)?;
                if let Some(project) = open_element(&stack, &frame, &element, &mut current)? {
                    current = Some((stack.len(), project));
                }
                stack.push(frame);
            }
            Event::Empty(element) => {
                let frame = read_frame(&element)?;
                if let Some(project) = open_element(&stack, &frame, &element, &mut current)? {
                    projects.push(project);
                }
            }
            Event::End(_) => {
                stack.pop();
                if current.as_ref().is_some_and(|(depth, _)| *depth == stack.len()) {
                    if let Some((_, project)) = current.take() {
                        projects.push(project);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    projects.retain(|project| !project.path.is_empty());
    Ok(projects)
}

fn open_element(
    stack: &[Frame],
    frame: &Frame,
    element: &BytesStart<'_>,
    current: &mut Option<(usize, RecentProject)>,
) -> Result<Option<RecentProject>, SourceError> {
    match frame.name.as_str() {
        "entry" if current.is_none() && inside_additional_info(stack) => {
            Ok(Some(RecentProject {
                path: attribute(element, b"key")?.unwrap_or_default(),
                opened_at_ms: 0,
            }))
        }
        "option" if frame.option_name.as_deref() == Some(OPEN_TIMESTAMP) => {
            if let Some((_, project)) = current.as_mut() {
                if project.opened_at_ms == 0 {
                    project.opened_at_ms = attribute(element, b"value")?
                        .and_then(|value| value.trim().parse().ok())
                        .unwrap_or(0);
                }
            }
            Ok(None)
        }
        _ => Ok(None),
    }
}

fn inside_additional_info(stack: &[Frame]) -> bool {
    let Some(application) = stack.iter().position(|frame| frame.name == "application") else {
        return false;
    };
    stack[application + 1..].iter().any(|frame| {
        frame.name == "option" && frame.option_name.as_deref() == Some(ADDITIONAL_INFO)
    })
}

fn read_frame(element: &BytesStart<'_>) -> Result<Frame, SourceError> {
    let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
    let option_name = if name == "option" {
        attribute(element, b"name")?
    } else {
        None
    };
    Ok(Frame { name, option_name })
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, SourceError> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

pub fn expand_home(path: &str, home_dir: &Path) -> String {
    path.replace(HOME_PLACEHOLDER, &home_dir.to_string_lossy())
}

pub struct JetBrainsSource {
    descriptor: SourceDescriptor,
}

impl JetBrainsSource {
    pub fn new(product: &IdeProduct) -> Self {
        let descriptor =
            SourceDescriptor::new(product.id, product.name, SourceGroup::Ide, Requirements::FILE_ONLY)
                .with_icon(&format!("icon/jetbrains-{}.png", product.id))
                .with_default_launcher(product.launcher)
                .with_config_file_name(product.file_name);
        Self { descriptor }
    }
}

impl SourceAdapter for JetBrainsSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn extract(
        &self,
        ctx: &ExtractContext<'_>,
        config: &SourceConfig,
    ) -> Result<Vec<CanonicalItem>, SourceError> {
        let data_path = require_data_path(config)?;
        let raw = std::fs::read_to_string(&data_path)?;
        let launcher = self.descriptor.launcher(config);

        let items = parse_recent_projects(&raw)?
            .into_iter()
            .map(|project| {
                let path = expand_home(&project.path, &ctx.home_dir);
                let name = Path::new(&path)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .filter(|stem| !stem.is_empty())
                    .unwrap_or_else(|| path.clone());
                let keys = SearchIndexBuilder::new(&name).path(&path).build();
                CanonicalItem::new(
                    &self.descriptor.id,
                    &name,
                    &path,
                    ctx.icons.for_path(&self.descriptor, Path::new(&path)),
                    LaunchCommand::shell(launcher.as_str(), [path.as_str()]),
                )
                .with_search_keys(keys)
                .with_sort_key(project.opened_at_ms / 1000)
                .with_exists(Path::new(&path).exists())
            })
            .collect();
        Ok(items)
    }
}

pub fn adapters() -> Vec<Box<dyn SourceAdapter>> {
    PRODUCTS
        .iter()
        .map(|product| Box::new(JetBrainsSource::new(product)) as Box<dyn SourceAdapter>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::PRODUCTS;

    #[test]
    fn config_dir_match_requires_a_version_after_the_prefix() {
        let pycharm = PRODUCTS.iter().find(|p| p.id == "pycharm").unwrap();
        assert!(pycharm.matches_config_dir("PyCharm2024.1"));
        assert!(!pycharm.matches_config_dir("PyCharmCE2024.1"));
        assert!(!pycharm.matches_config_dir("PyCharm"));
    }

    #[test]
    fn rider_reads_recent_solutions() {
        let rider = PRODUCTS.iter().find(|p| p.id == "rider").unwrap();
        assert_eq!(rider.file_name, "recentSolutions.xml");
    }
}
