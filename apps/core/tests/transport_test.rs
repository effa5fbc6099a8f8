use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use recentfind_core::config::EngineConfig;
use recentfind_core::config_state::Requirements;
use recentfind_core::contract::{CoreRequest, CoreResponse, SearchRequest};
use recentfind_core::core_service::CatalogService;
use recentfind_core::model::{CanonicalItem, IconRef, LaunchCommand};
use recentfind_core::settings::{MemorySettings, SourceConfig};
use recentfind_core::source::{SourceAdapter, SourceDescriptor, SourceGroup, StaticSource};
use recentfind_core::transport::{handle_json, handle_request, ErrorCode, TransportResponse};

fn service(dir: &Path) -> CatalogService {
    let data = dir.join("notes.data");
    std::fs::write(&data, b"ok").unwrap();
    let descriptor = SourceDescriptor::new("notes", "Notes", SourceGroup::Notes, Requirements::FILE_ONLY);
    let items = vec![CanonicalItem::new(
        "notes",
        "Quarterly report",
        "[Work]",
        IconRef::default(),
        LaunchCommand::handler("test://report"),
    )];
    CatalogService::new(EngineConfig::default())
        .unwrap()
        .with_settings(
            MemorySettings::new().with_source("notes", SourceConfig::default().with_data_path(&data)),
        )
        .with_sources(vec![Box::new(StaticSource::new(descriptor, items)) as Box<dyn SourceAdapter>])
}

fn temp_dir(label: &str) -> std::path::PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("recentfind-transport-{label}-{unique}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn decode(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap()
}

#[test]
fn search_json_round_trip() {
    let dir = temp_dir("search");
    let service = service(&dir);

    let response = decode(&handle_json(
        &service,
        r#"{"kind":"Search","payload":{"query":"report","limit":5}}"#,
    ));
    assert_eq!(response["status"], "ok");
    assert_eq!(response["response"]["kind"], "Search");
    assert_eq!(response["response"]["payload"]["items"][0]["title"], "Quarterly report");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn malformed_json_is_reported() {
    let dir = temp_dir("malformed");
    let service = service(&dir);

    let response = decode(&handle_json(&service, "{not json"));
    assert_eq!(response["status"], "err");
    assert_eq!(response["error"]["code"], "invalid_json");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn service_errors_map_to_codes() {
    let dir = temp_dir("errors");
    let service = service(&dir);

    let empty = decode(&handle_json(
        &service,
        r#"{"kind":"Search","payload":{"query":"","limit":null}}"#,
    ));
    assert_eq!(empty["error"]["code"], "invalid_request");

    let unknown = decode(&handle_json(
        &service,
        r#"{"kind":"Source","payload":{"id":"safari-history"}}"#,
    ));
    assert_eq!(unknown["error"]["code"], "source_not_found");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn typed_requests_bypass_json() {
    let dir = temp_dir("typed");
    let service = service(&dir);

    let response = handle_request(
        &service,
        CoreRequest::Search(SearchRequest {
            query: "quarterly".into(),
            limit: None,
        }),
    );
    match response {
        TransportResponse::Ok {
            response: CoreResponse::Search(payload),
        } => assert_eq!(payload.items.len(), 1),
        other => panic!("unexpected response: {other:?}"),
    }

    let response = handle_request(
        &service,
        CoreRequest::Search(SearchRequest {
            query: " ".into(),
            limit: None,
        }),
    );
    match response {
        TransportResponse::Err { error } => assert_eq!(error.code, ErrorCode::InvalidRequest),
        other => panic!("unexpected response: {other:?}"),
    }
    let _ = std::fs::remove_dir_all(&dir);
}
