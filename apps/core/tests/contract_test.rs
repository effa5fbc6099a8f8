use recentfind_core::config_state::ReadinessState;
use recentfind_core::contract::{
    CoreRequest, CoreResponse, ItemDto, ItemsResponse, LaunchDto, SearchRequest, SourceRequest,
    SourceStatusDto, StatusResponse,
};
use recentfind_core::model::{CanonicalItem, IconRef, LaunchCommand};
use recentfind_core::source::SourceGroup;

#[test]
fn serializes_and_deserializes_search_request() {
    let request = CoreRequest::Search(SearchRequest {
        query: "code".to_string(),
        limit: Some(5),
    });

    let encoded = serde_json::to_string(&request).unwrap();
    let decoded: CoreRequest = serde_json::from_str(&encoded).unwrap();

    assert_eq!(decoded, request);
}

#[test]
fn decodes_requests_by_kind() {
    let status: CoreRequest = serde_json::from_str(r#"{"kind":"Status"}"#).unwrap();
    assert_eq!(status, CoreRequest::Status);

    let source: CoreRequest =
        serde_json::from_str(r#"{"kind":"Source","payload":{"id":"vscode"}}"#).unwrap();
    assert_eq!(
        source,
        CoreRequest::Source(SourceRequest {
            id: "vscode".into()
        })
    );

    assert!(serde_json::from_str::<CoreRequest>(r#"{"kind":"Launch","payload":{}}"#).is_err());
}

#[test]
fn item_dto_carries_launch_as_tagged_object() {
    let item = CanonicalItem::new(
        "chrome-history",
        "Docs",
        "https://docs.example.com/",
        IconRef::new("icon/chrome-history.png"),
        LaunchCommand::handler("https://docs.example.com/"),
    )
    .with_sort_key(1_700_000_000);

    let dto = ItemDto::from(item);
    let value = serde_json::to_value(&dto).unwrap();

    assert_eq!(value["launch"]["type"], "handler");
    assert_eq!(value["launch"]["uri"], "https://docs.example.com/");
    assert_eq!(value["sort_key"], 1_700_000_000);
    assert_eq!(value["search_keys"][0], "Docs");
    assert_eq!(value["icon"], "icon/chrome-history.png");
}

#[test]
fn shell_launch_keeps_program_and_args() {
    let launch = LaunchDto::from(LaunchCommand::shell("code", ["-n", "/work/app"]));
    assert_eq!(
        launch,
        LaunchDto::Shell {
            program: "code".into(),
            args: vec!["-n".into(), "/work/app".into()],
        }
    );
}

#[test]
fn responses_round_trip_through_json() {
    let response = CoreResponse::Status(StatusResponse {
        sources: vec![SourceStatusDto {
            id: "idea".into(),
            name: "IntelliJ IDEA Ultimate".into(),
            group: SourceGroup::Ide,
            state: ReadinessState::Undone,
        }],
    });
    let encoded = serde_json::to_string(&response).unwrap();
    assert!(encoded.contains(r#""state":"undone""#));
    assert!(encoded.contains(r#""group":"ide""#));
    let decoded: CoreResponse = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, response);

    let empty = CoreResponse::Catalog(ItemsResponse::from_items(Vec::new()));
    let decoded: CoreResponse = serde_json::from_str(&serde_json::to_string(&empty).unwrap()).unwrap();
    assert_eq!(decoded, empty);
}
