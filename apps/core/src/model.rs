use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IconRef(String);

impl IconRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchCommand {
    Shell { program: String, args: Vec<String> },
    Handler { uri: String },
}

impl LaunchCommand {
    pub fn shell<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Shell {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn handler(uri: impl Into<String>) -> Self {
        Self::Handler { uri: uri.into() }
    }
}

impl Display for LaunchCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shell { program, args } => {
                write!(f, "\"{program}\"")?;
                for arg in args {
                    write!(f, " \"{arg}\"")?;
                }
                Ok(())
            }
            Self::Handler { uri } => write!(f, "{uri}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchKeys(Vec<String>);

impl SearchKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>) -> bool {
        let token = token.into();
        if token.trim().is_empty() || self.contains(&token) {
            return false;
        }
        self.0.push(token);
        true
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|existing| existing == token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> Extend<S> for SearchKeys {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for token in iter {
            self.insert(token);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalItem {
    pub source_id: String,
    pub title: String,
    pub description: String,
    pub icon: IconRef,
    pub search_keys: SearchKeys,
    pub sort_key: i64,
    pub exists: bool,
    pub launch: LaunchCommand,
    normalized_keys: Vec<String>,
}

impl CanonicalItem {
    pub fn new(
        source_id: &str,
        title: &str,
        description: &str,
        icon: IconRef,
        launch: LaunchCommand,
    ) -> Self {
        let mut search_keys = SearchKeys::new();
        search_keys.insert(title);
        let mut item = Self {
            source_id: source_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            icon,
            search_keys,
            sort_key: 0,
            exists: true,
            launch,
            normalized_keys: Vec::new(),
        };
        item.refresh_normalized_keys();
        item
    }

    // Merges `keys` into the item's search keys; the title always stays first.
    pub fn with_search_keys(mut self, keys: SearchKeys) -> Self {
        self.search_keys.extend(keys.into_vec());
        self.refresh_normalized_keys();
        self
    }

    pub fn with_sort_key(mut self, sort_key: i64) -> Self {
        self.sort_key = sort_key.max(0);
        self
    }

    pub fn with_exists(mut self, exists: bool) -> Self {
        self.exists = exists;
        self
    }

    pub fn normalized_keys(&self) -> &[String] {
        &self.normalized_keys
    }

    fn refresh_normalized_keys(&mut self) {
        self.normalized_keys = self
            .search_keys
            .iter()
            .map(normalize_for_search)
            .filter(|key| !key.is_empty())
            .collect();
    }
}

pub fn normalize_for_search(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
