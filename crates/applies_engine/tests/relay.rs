use std::sync::{Arc, Once};
use std::time::Duration;

use applies_core::{FilterSettings, SubjectId, UiQuery, UiResponse};
use applies_engine::{
    ContentRelay, EngineConfig, EngineHandle, OutcomeRouter, PageSnapshot, WindowEvents,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

fn config_for(server: &MockServer, page_path: &str) -> EngineConfig {
    INIT.call_once(applies_logging::initialize_for_tests);
    EngineConfig {
        page_url: format!("{}{}", server.uri(), page_path),
        filter: FilterSettings {
            target_domain: "127.0.0.1".to_string(),
            ..FilterSettings::default()
        },
        cookie: Some("JSESSIONID=\"ajax:5\"".to_string()),
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn job_details_round_trip_through_all_contexts() {
    let server = MockServer::start().await;
    let posting = json!({"applies": 57, "views": 1200, "jobState": "LISTED"});
    Mock::given(method("GET"))
        .and(path("/voyager/api/jobs/jobPostings/3900123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posting.clone()))
        .mount(&server)
        .await;

    let engine = EngineHandle::start(config_for(&server, "/jobs/search/?currentJobId=3900123")).unwrap();
    let response = engine.query(UiQuery::GetJobDetails).await;

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"ok": true, "data": posting, "status": 200, "csrfPresent": true, "jobId": "3900123"})
    );

    // The relay's own fetch went through the tap, so the tracker saw it too.
    let subject = SubjectId::parse("3900123").unwrap();
    let mut recorded = None;
    for _ in 0..50 {
        recorded = engine.tracker().latest(&subject);
        if recorded.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(recorded.map(|entry| entry.applies), Some(57.0));
    assert!(engine.store().get("applies:3900123").is_some());
}

#[tokio::test]
async fn navigation_is_checked_before_anything_else() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let engine = EngineHandle::start(config_for(&server, "/feed/")).unwrap();
    let response = engine.query(UiQuery::GetJobDetails).await;
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"ok": false, "error": "Not a /jobs/ page"})
    );

    engine.navigate(PageSnapshot::new(format!("{}/jobs/collections/recommended/", server.uri())));
    let response = engine.query(UiQuery::GetJobDetails).await;
    assert_eq!(response, UiResponse::failure("No jobId on this page"));
}

#[tokio::test]
async fn subject_falls_back_to_page_markup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/voyager/api/jobs/jobPostings/818"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"applies": 1})))
        .mount(&server)
        .await;

    let engine = EngineHandle::start(config_for(&server, "/jobs/")).unwrap();
    engine.navigate(
        PageSnapshot::new(format!("{}/jobs/collections/", server.uri()))
            .with_html(r#"<li data-entity-urn="urn:li:jobPosting:818"></li>"#),
    );

    let response = engine.query(UiQuery::GetJobDetails).await;
    assert!(response.is_ok());
    assert_eq!(response.subject_id(), Some("818"));
}

#[tokio::test]
async fn http_failure_is_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/voyager/api/jobs/jobPostings/44"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let engine = EngineHandle::start(config_for(&server, "/jobs/view/44/")).unwrap();
    let response = engine.query(UiQuery::GetJobDetails).await;

    assert_eq!(
        response,
        UiResponse::Failure {
            error: "HTTP 401".to_string(),
            status: Some(401),
            auth_token_present: Some(true),
            subject_id: Some("44".to_string()),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn silent_page_context_yields_timeout() {
    // Nobody serves the window.
    let (_navigator, snapshots) =
        watch::channel(PageSnapshot::new("https://www.linkedin.com/jobs/view/12/"));
    let relay = ContentRelay::new(
        snapshots,
        Arc::new(OutcomeRouter::new()),
        WindowEvents::default(),
        Duration::from_secs(12),
        1,
    )
    .spawn(CancellationToken::new());

    let response = relay.query(UiQuery::GetJobDetails).await;
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"ok": false, "error": "Timeout", "status": 0, "jobId": "12"})
    );
}
