//! Loading test definitions from inline data, remote test files and disk

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use attacomm::loader::{load_test, LoadedTest};
use attacomm::reporter::LOADING_CASE;
use attacomm::transport::Transport;
use attacomm::{
    DomReady, Events, LoadParams, RecordingHarness, Session, SessionConfig, SessionEvent,
    SessionOutcome, TestDefinition,
};

fn definition() -> serde_json::Value {
    json!({
        "title": "checkbox state",
        "description": "Checked checkbox exposes the checked state",
        "IAccessible2": [
            ["property", "states", "contains", "STATE_SYSTEM_CHECKED"]
        ],
        "AXAPI": [
            ["property", "AXValue", "is", "1"],
            ["property", "AXRole", "is", "AXCheckBox"]
        ]
    })
}

fn transport() -> Transport {
    Transport::new(Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_remote_file_matches_inline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tests/checkbox.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(definition().to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let remote = load_test(
        &LoadParams::file(format!("{}/tests/checkbox.json", server.uri())),
        &transport(),
    )
    .await
    .unwrap();
    assert!(matches!(remote, LoadedTest::Text(_)));

    let inline = load_test(&LoadParams::inline(definition()), &transport())
        .await
        .unwrap();

    assert_eq!(
        remote.into_definition().unwrap(),
        inline.into_definition().unwrap()
    );
}

#[tokio::test]
async fn test_file_wins_over_inline() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("checkbox.json");
    std::fs::write(&file, definition().to_string()).unwrap();

    let params = LoadParams {
        test: Some(json!({ "title": "ignored" })),
        test_file: Some(file.display().to_string()),
        name: None,
    };
    let loaded = load_test(&params, &transport()).await.unwrap();
    assert_eq!(loaded.into_definition().unwrap().title(), "checkbox state");
}

#[tokio::test]
async fn test_parsing_twice_is_stable() {
    let value = definition();
    let first = TestDefinition::from_value(&value).unwrap();
    let second = TestDefinition::from_value(&value).unwrap();
    assert_eq!(first, second);
    assert_eq!(value, definition());
}

#[tokio::test]
async fn test_missing_remote_file_fails_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tests/missing.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let harness = Arc::new(RecordingHarness::new());
    let (events, mut rx) = Events::channel();
    let config = SessionConfig::default().with_adapter_uri(format!("{}/ATTA", server.uri()));
    let session = Session::new(config, harness.clone(), events).unwrap();

    let params = LoadParams::file(format!("{}/tests/missing.json", server.uri()));
    let outcome = session.run(&params, DomReady::fired()).await.unwrap();

    assert!(matches!(outcome, SessionOutcome::LoadFailed(ref m) if m.contains("404")));
    assert!(harness.is_done());
    let cases = harness.cases();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].name, LOADING_CASE);
    assert!(cases[0].assertions[0]
        .message
        .as_deref()
        .unwrap()
        .starts_with("Loading of test components failed"));
    assert!(matches!(rx.try_recv().unwrap(), SessionEvent::LoadFailed { .. }));

    // Only the test file was requested; the adapter was never contacted.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_malformed_remote_file_fails_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tests/broken.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"title\": "))
        .mount(&server)
        .await;

    let harness = Arc::new(RecordingHarness::new());
    let session = Session::new(SessionConfig::default(), harness.clone(), Events::disabled()).unwrap();
    let params = LoadParams::file(format!("{}/tests/broken.json", server.uri()));
    let outcome = session.run(&params, DomReady::fired()).await.unwrap();

    assert!(matches!(outcome, SessionOutcome::LoadFailed(_)));
    assert!(!session.is_ready());
    assert!(!harness.all_passed());
}
