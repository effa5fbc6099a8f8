use pinyin::ToPinyin;
use url::Url;

use crate::model::SearchKeys;

#[derive(Debug, Clone, Default)]
pub struct SearchIndexBuilder<'a> {
    title: &'a str,
    url: Option<&'a str>,
    path: Option<&'a str>,
    phonetic_extra: Vec<&'a str>,
}

impl<'a> SearchIndexBuilder<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            ..Self::default()
        }
    }

    pub fn url(mut self, url: &'a str) -> Self {
        self.url = Some(url);
        self
    }

    pub fn path(mut self, path: &'a str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn phonetic_text(mut self, text: &'a str) -> Self {
        self.phonetic_extra.push(text);
        self
    }

    pub fn build(self) -> SearchKeys {
        let mut keys = SearchKeys::new();
        keys.insert(self.title);
        keys.extend(phonetic_tokens(self.title));
        for text in &self.phonetic_extra {
            keys.extend(phonetic_tokens(text));
            keys.insert(*text);
        }
        if let Some(url) = self.url {
            keys.extend(host_token(url));
            keys.extend(strip_query(url));
        }
        if let Some(path) = self.path {
            keys.extend(path_tokens(path));
        }
        keys
    }
}

pub fn build(title: &str, url: Option<&str>, path: Option<&str>) -> SearchKeys {
    let mut builder = SearchIndexBuilder::new(title);
    if let Some(url) = url {
        builder = builder.url(url);
    }
    if let Some(path) = path {
        builder = builder.path(path);
    }
    builder.build()
}

pub fn phonetic_tokens(text: &str) -> Vec<String> {
    let mut full = String::with_capacity(text.len() * 3);
    let mut initials = String::with_capacity(text.len());
    let mut transliterated = false;

    for ch in text.chars() {
        match ch.to_pinyin() {
            Some(pinyin) => {
                full.push_str(pinyin.plain());
                initials.push_str(pinyin.first_letter());
                transliterated = true;
            }
            None => {
                full.push(ch);
                initials.push(ch);
            }
        }
    }

    if !transliterated {
        return Vec::new();
    }
    vec![full, initials]
}

pub fn host_token(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

// Unparseable input is returned unchanged when it has no `?`, otherwise cut at the `?`.
pub fn strip_query(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Url::parse(trimmed) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            Some(parsed.to_string())
        }
        Err(_) => {
            let (before, after) = match trimmed.split_once('?') {
                Some((before, rest)) => {
                    let fragment = rest.find('#').map(|at| &rest[at..]).unwrap_or("");
                    (before, fragment)
                }
                None => (trimmed, ""),
            };
            Some(format!("{before}{after}"))
        }
    }
}

pub fn path_tokens(path: &str) -> Vec<String> {
    let normalized = path.trim().replace('\\', "/");
    let trimmed = normalized.trim_end_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut tokens = vec![trimmed.to_string()];
    let mut segments = trimmed.rsplit('/').filter(|segment| !segment.is_empty());
    let leaf = segments.next();
    let parent = segments.next();
    if let Some(parent) = parent {
        tokens.push(parent.to_string());
    }
    if let Some(leaf) = leaf {
        tokens.push(leaf.to_string());
    }
    tokens
}
