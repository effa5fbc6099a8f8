use crate::config_state::Requirements;
use crate::error::SourceError;
use crate::model::{CanonicalItem, LaunchCommand};
use crate::search_index::{strip_query, SearchIndexBuilder};
use crate::settings::SourceConfig;
use crate::source::{query_source, ExtractContext, SourceAdapter, SourceDescriptor, SourceGroup};
use crate::tabular::{self, RawRow};

// Seconds between the Unix epoch and 2001-01-01T00:00:00Z.
pub const CORE_DATA_EPOCH_OFFSET: i64 = 978_307_200;
// Seconds between 1601-01-01T00:00:00Z and the Unix epoch.
pub const WEBKIT_EPOCH_OFFSET: i64 = 11_644_473_600;

const MICROS_PER_SECOND: i64 = 1_000_000;

// Title goes last: an unescaped delimiter inside it can then only truncate the title.
const COLUMNS: [&str; 3] = ["url", "n/visit_time", "title"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySchema {
    Safari,
    Chromium,
    Firefox,
}

impl HistorySchema {
    pub fn sql(self, limit: u32) -> String {
        let body = match self {
            Self::Safari => {
                "select i.url as url, max(v.visit_time) as visit_time, v.title as title \
                 from history_items i join history_visits v on i.id = v.history_item \
                 group by i.url order by visit_time desc"
            }
            Self::Chromium => {
                "select u.url as url, max(v.visit_time) as visit_time, u.title as title \
                 from urls u join visits v on u.id = v.url \
                 group by u.url order by visit_time desc"
            }
            Self::Firefox => {
                "select p.url as url, max(v.visit_date) as visit_time, p.title as title \
                 from moz_places p join moz_historyvisits v on p.id = v.place_id \
                 group by p.url order by visit_time desc"
            }
        };
        format!("{body} limit {limit}")
    }

    pub fn to_unix_seconds(self, raw: i64) -> i64 {
        if raw <= 0 {
            return 0;
        }
        let seconds = match self {
            Self::Safari => raw.saturating_add(CORE_DATA_EPOCH_OFFSET),
            Self::Chromium => raw / MICROS_PER_SECOND - WEBKIT_EPOCH_OFFSET,
            Self::Firefox => raw / MICROS_PER_SECOND,
        };
        seconds.max(0)
    }
}

pub struct BrowserHistorySource {
    descriptor: SourceDescriptor,
    schema: HistorySchema,
}

impl BrowserHistorySource {
    pub fn new(descriptor: SourceDescriptor, schema: HistorySchema) -> Self {
        Self { descriptor, schema }
    }

    pub fn schema(&self) -> HistorySchema {
        self.schema
    }

    fn to_item(&self, ctx: &ExtractContext<'_>, row: &RawRow) -> Option<CanonicalItem> {
        let url = row.text("url").trim().to_string();
        if url.is_empty() {
            return None;
        }
        let title = match row.text("title").trim() {
            "" => url.clone(),
            title => title.to_string(),
        };

        let icon_url = strip_query(&url).unwrap_or_else(|| url.clone());
        let keys = SearchIndexBuilder::new(&title).url(&url).build();
        let item = CanonicalItem::new(
            &self.descriptor.id,
            &title,
            &url,
            ctx.icons.for_url(&self.descriptor, &icon_url),
            LaunchCommand::handler(url.as_str()),
        )
        .with_search_keys(keys)
        .with_sort_key(self.schema.to_unix_seconds(row.integer("visit_time")));
        Some(item)
    }
}

impl SourceAdapter for BrowserHistorySource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn extract(
        &self,
        ctx: &ExtractContext<'_>,
        config: &SourceConfig,
    ) -> Result<Vec<CanonicalItem>, SourceError> {
        let sql = self.schema.sql(ctx.history_limit);
        let output = query_source(ctx, &self.descriptor, config, &sql)?;
        let rows = tabular::parse(&output, &tabular::columns(&COLUMNS));
        Ok(rows
            .iter()
            .filter_map(|row| self.to_item(ctx, row))
            .take(ctx.history_limit as usize)
            .collect())
    }
}

pub fn adapters() -> Vec<Box<dyn SourceAdapter>> {
    let browsers: [(&str, &str, HistorySchema, &str); 4] = [
        ("safari-history", "Safari", HistorySchema::Safari, "History.db"),
        ("chrome-history", "Google Chrome", HistorySchema::Chromium, "History"),
        ("edge-history", "Microsoft Edge", HistorySchema::Chromium, "History"),
        ("firefox-history", "Firefox", HistorySchema::Firefox, "places.sqlite"),
    ];

    browsers
        .into_iter()
        .map(|(id, name, schema, file_name)| {
            let descriptor =
                SourceDescriptor::new(id, name, SourceGroup::BrowserHistory, Requirements::SQLITE)
                    .with_config_file_name(file_name);
            Box::new(BrowserHistorySource::new(descriptor, schema)) as Box<dyn SourceAdapter>
        })
        .collect()
}
