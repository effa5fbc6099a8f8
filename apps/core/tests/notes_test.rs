use recentfind_core::notes::{self, describe, launch_uri, NoteRecord, NotesSchema};

#[test]
fn mac_rows_keep_guid_and_smart_tags() {
    let raw = "guid-1|1700000000000|rust,cli|[\"plan\"]|Work|Projects|Release notes\n\
               guid-2|4210|||Inbox||\n";
    let records = NotesSchema::Mac.parse_rows(raw);

    assert_eq!(
        records[0],
        NoteRecord {
            guid: "guid-1".into(),
            title: "Release notes".into(),
            sequence: 1_700_000_000_000,
            tags: "rust,cli".into(),
            smart_tags: Some("[\"plan\"]".into()),
            notebook: "Work".into(),
            stack: "Projects".into(),
        }
    );
    assert_eq!(records[1].title, "");
    assert_eq!(records[1].smart_tags, None);
    assert_eq!(records[1].notebook, "Inbox");
}

#[test]
fn windows_rows_decode_packed_guids() {
    let raw = "D8A6B3C63C3F0E4B9F7F2C0E0B9C6A11|4210|todo|Inbox||Groceries\n";
    let records = NotesSchema::Windows.parse_rows(raw);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].guid, "c6b3a6d8-3f3c-4b0e-9f7f-2c0e0b9c6a11");
    assert_eq!(records[0].title, "Groceries");
    assert_eq!(records[0].sequence, 4210);
    assert_eq!(records[0].smart_tags, None);
}

#[test]
fn rows_without_guid_are_dropped() {
    let raw = "|12|tag|Inbox||Orphan\nAABBCCDD00112233445566778899AABB|13|||| Kept \n";
    let records = NotesSchema::Windows.parse_rows(raw);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Kept");
}

#[test]
fn delimiter_in_title_truncates_only_the_title() {
    let raw = "guid-3|7|a|[]|Work||Q1|Q2 plan\n";
    let records = NotesSchema::Mac.parse_rows(raw);
    assert_eq!(records[0].title, "Q1");
    assert_eq!(records[0].notebook, "Work");
}

#[test]
fn description_omits_empty_parts() {
    let record = NoteRecord {
        guid: "g".into(),
        tags: " , rust ,".into(),
        smart_tags: Some("[]".into()),
        ..NoteRecord::default()
    };
    assert_eq!(describe(&record), "[Tags: rust]");
    assert_eq!(describe(&NoteRecord::default()), "");
}

#[test]
fn launch_uri_repeats_the_guid() {
    assert_eq!(
        launch_uri("12345", "abc"),
        "evernote:///view/12345/s0/abc/abc/"
    );
}

#[test]
fn windows_source_needs_an_account() {
    let windows = notes::adapters()
        .into_iter()
        .find(|adapter| adapter.descriptor().id == "evernote-win")
        .unwrap();
    assert!(windows.descriptor().requirements.account);
}
