use std::path::Path;

use crate::config_state::Requirements;
use crate::error::SourceError;
use crate::guid;
use crate::model::{CanonicalItem, LaunchCommand};
use crate::search_index::SearchIndexBuilder;
use crate::settings::SourceConfig;
use crate::source::{
    query_source, require_data_path, ExtractContext, SourceAdapter, SourceDescriptor, SourceGroup,
};
use crate::tabular::{self, RawRow};

const NOTES_ICON: &str = "icon/evernote.png";

// Sequence values above this are millisecond timestamps rather than counters.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

const MAC_SQL: &str = "select n.ZGUID as id, n.ZUPDATESEQUENCENUMBER as seq, tm.name as tag, \
    n.ZSMARTTAGS as smart_tag, nb.ZNAME as level_one, nb.ZSTACK as level_two, n.ZTITLE as title \
    from ZENNOTE n, ZENNOTEBOOK nb \
    left join (select n.ZGUID as guid, group_concat(t.ZNAME) as name \
               from ZENNOTE n, Z_10TAGS tm, ZENTAG t \
               where n.ZACTIVE = 1 and n.Z_PK = tm.Z_10NOTES and t.Z_PK = tm.Z_23TAGS \
               group by n.ZGUID) tm on n.ZGUID = tm.guid \
    where n.ZNOTEBOOK = nb.Z_PK and n.ZACTIVE = 1 \
    order by n.ZUPDATESEQUENCENUMBER desc";

const MAC_COLUMNS: [&str; 7] = ["id", "n/seq", "tag", "smart_tag", "level_one", "level_two", "title"];

const WINDOWS_SQL: &str = "select hex(i.guid) as guid, n.date_updated as seq, n.tags as tag, \
    nb.name as level_one, nb.stack as level_two, n.title as title \
    from note_attr n, notebook_attr nb, items i \
    where n.uid = i.uid and n.notebook_uid is not null and n.notebook_uid = nb.uid \
    and n.is_deleted is null \
    order by n.date_updated desc";

const WINDOWS_COLUMNS: [&str; 6] = ["guid", "n/seq", "tag", "level_one", "level_two", "title"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotesSchema {
    Mac,
    Windows,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteRecord {
    pub guid: String,
    pub title: String,
    pub sequence: i64,
    pub tags: String,
    pub smart_tags: Option<String>,
    pub notebook: String,
    pub stack: String,
}

impl NotesSchema {
    pub fn sql(self) -> &'static str {
        match self {
            Self::Mac => MAC_SQL,
            Self::Windows => WINDOWS_SQL,
        }
    }

    pub fn parse_rows(self, raw: &str) -> Vec<NoteRecord> {
        let columns = match self {
            Self::Mac => tabular::columns(&MAC_COLUMNS),
            Self::Windows => tabular::columns(&WINDOWS_COLUMNS),
        };
        tabular::parse(raw, &columns)
            .iter()
            .map(|row| self.record(row))
            .filter(|record| !record.guid.is_empty())
            .collect()
    }

    fn record(self, row: &RawRow) -> NoteRecord {
        let (guid, smart_tags) = match self {
            Self::Mac => (row.text("id"), Some(row.text("smart_tag"))),
            Self::Windows => (guid::decode(row.text("guid").trim()), None),
        };
        NoteRecord {
            guid: guid.trim().to_string(),
            title: row.text("title").trim().to_string(),
            sequence: row.integer("seq"),
            tags: row.text("tag"),
            smart_tags: smart_tags.filter(|text| !text.trim().is_empty()),
            notebook: row.text("level_one"),
            stack: row.text("level_two"),
        }
    }
}

pub fn describe(record: &NoteRecord) -> String {
    let mut parts = Vec::new();
    if !record.notebook.trim().is_empty() {
        if record.stack.trim().is_empty() {
            parts.push(format!("[{}]", record.notebook.trim()));
        } else {
            parts.push(format!("[{} → {}]", record.notebook.trim(), record.stack.trim()));
        }
    }

    let tags = split_tags(&record.tags);
    if !tags.is_empty() {
        parts.push(format!("[Tags: {}]", tags.join(", ")));
    }

    if let Some(raw) = &record.smart_tags {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(smart) if !smart.is_empty() => parts.push(format!("[AI tags: {}]", smart.join(", "))),
            Ok(_) => {}
            Err(error) => log::debug!("ignoring smart tags of note {}: {error}", record.guid),
        }
    }

    parts.join(" ")
}

fn split_tags(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .collect()
}

pub fn launch_uri(account: &str, guid: &str) -> String {
    format!("evernote:///view/{account}/s0/{guid}/{guid}/")
}

pub fn account_from_data_path(path: &Path) -> Option<String> {
    path.parent()?
        .parent()?
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

fn sequence_sort_key(sequence: i64) -> i64 {
    if sequence > MILLIS_THRESHOLD {
        sequence / 1000
    } else {
        sequence
    }
}

pub struct NotesSource {
    descriptor: SourceDescriptor,
    schema: NotesSchema,
}

impl NotesSource {
    pub fn new(descriptor: SourceDescriptor, schema: NotesSchema) -> Self {
        Self { descriptor, schema }
    }

    fn account(&self, config: &SourceConfig) -> Result<String, SourceError> {
        if let Some(account) = config.account() {
            return Ok(account.to_string());
        }
        match self.schema {
            NotesSchema::Mac => account_from_data_path(&require_data_path(config)?)
                .ok_or_else(|| SourceError::unavailable("no account id in data path")),
            NotesSchema::Windows => Err(SourceError::unavailable("no account id configured")),
        }
    }

    fn to_item(&self, ctx: &ExtractContext<'_>, account: &str, record: &NoteRecord) -> CanonicalItem {
        let title = if record.title.is_empty() {
            record.guid.as_str()
        } else {
            record.title.as_str()
        };
        let description = describe(record);
        let keys = SearchIndexBuilder::new(title)
            .phonetic_text(&description)
            .build();
        let uri = launch_uri(account, &record.guid);
        CanonicalItem::new(
            &self.descriptor.id,
            title,
            &description,
            ctx.icons.for_url(&self.descriptor, &uri),
            LaunchCommand::handler(uri.as_str()),
        )
        .with_search_keys(keys)
        .with_sort_key(sequence_sort_key(record.sequence))
    }
}

impl SourceAdapter for NotesSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn extract(
        &self,
        ctx: &ExtractContext<'_>,
        config: &SourceConfig,
    ) -> Result<Vec<CanonicalItem>, SourceError> {
        let account = self.account(config)?;
        let output = query_source(ctx, &self.descriptor, config, self.schema.sql())?;
        Ok(self
            .schema
            .parse_rows(&output)
            .iter()
            .map(|record| self.to_item(ctx, &account, record))
            .collect())
    }
}

pub fn adapters() -> Vec<Box<dyn SourceAdapter>> {
    let mac = SourceDescriptor::new("evernote-mac", "Evernote (macOS)", SourceGroup::Notes, Requirements::SQLITE)
        .with_icon(NOTES_ICON)
        .with_config_file_name("LocalNoteStore.sqlite");
    let windows = SourceDescriptor::new(
        "evernote-win",
        "Evernote (Windows)",
        SourceGroup::Notes,
        Requirements::SQLITE_WITH_ACCOUNT,
    )
    .with_icon(NOTES_ICON)
    .with_config_file_name("app.yinxiang.com.exb");

    vec![
        Box::new(NotesSource::new(mac, NotesSchema::Mac)),
        Box::new(NotesSource::new(windows, NotesSchema::Windows)),
    ]
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{account_from_data_path, describe, sequence_sort_key, NoteRecord};

    #[test]
    fn description_joins_notebook_tags_and_smart_tags() {
        let record = NoteRecord {
            guid: "g".into(),
            notebook: "Work".into(),
            stack: "Projects".into(),
            tags: "rust, cli".into(),
            smart_tags: Some(r#"["planning"]"#.into()),
            ..NoteRecord::default()
        };
        assert_eq!(
            describe(&record),
            "[Work → Projects] [Tags: rust, cli] [AI tags: planning]"
        );
    }

    #[test]
    fn malformed_smart_tags_are_left_out() {
        let record = NoteRecord {
            guid: "g".into(),
            notebook: "Inbox".into(),
            smart_tags: Some("not json".into()),
            ..NoteRecord::default()
        };
        assert_eq!(describe(&record), "[Inbox]");
    }

    #[test]
    fn account_is_two_levels_above_the_store() {
        let path = Path::new("/Users/me/accounts/app.yinxiang.com/12345/localNoteStore/LocalNoteStore.sqlite");
        assert_eq!(account_from_data_path(path).as_deref(), Some("12345"));
    }

    #[test]
    fn millisecond_sequences_become_seconds() {
        assert_eq!(sequence_sort_key(4_210), 4_210);
        assert_eq!(sequence_sort_key(1_700_000_000_000), 1_700_000_000);
    }
}
