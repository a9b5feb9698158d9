use std::sync::Arc;
use std::time::Duration;

use applies_core::{CapturedExchange, FilterSettings, InterestFilter};
use applies_engine::{
    EventRequestObject, ExchangeBus, FailureKind, FetchError, FetchPrimitive, FetchSettings,
    HttpRequest, HttpResponse, PageContext, RequestObject, ReqwestFetch, TapError, TapInstall,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::{broadcast, oneshot};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUIET: Duration = Duration::from_millis(300);

fn local_filter(origin: &str) -> InterestFilter {
    InterestFilter::new(
        FilterSettings {
            target_domain: "127.0.0.1".to_string(),
            ..FilterSettings::default()
        },
        origin,
    )
}

fn page_for(server: &MockServer) -> PageContext {
    applies_logging::initialize_for_tests();
    let origin = format!("{}/", server.uri());
    let fetch: Arc<dyn FetchPrimitive> =
        Arc::new(ReqwestFetch::new(FetchSettings::default(), &origin).unwrap());
    let request_object = Arc::new(EventRequestObject::new(
        fetch.clone(),
        tokio::runtime::Handle::current(),
    ));
    PageContext::new(origin, fetch, request_object)
}

async fn next_exchange(rx: &mut broadcast::Receiver<CapturedExchange>) -> Option<CapturedExchange> {
    tokio::time::timeout(QUIET, rx.recv()).await.ok().and_then(Result::ok)
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_style_response_is_broadcast_and_returned_unchanged() {
    let server = MockServer::start().await;
    let body = json!({"data": {"applies": 42}});
    mount_json(&server, "/voyager/api/jobs/jobPostings/42", body.clone()).await;

    let page = page_for(&server);
    let bus = ExchangeBus::default();
    let mut rx = bus.subscribe();
    let installed = page.install_tap(local_filter(page.origin()), bus.clone()).unwrap();
    assert_eq!(installed, TapInstall::Installed);

    let response = page
        .fetch(HttpRequest::get("/voyager/api/jobs/jobPostings/42"))
        .await
        .expect("fetch ok");
    assert_eq!(response.status, 200);
    assert_eq!(serde_json::from_slice::<serde_json::Value>(&response.body).unwrap(), body);

    let exchange = next_exchange(&mut rx).await.expect("exchange broadcast");
    assert!(exchange.url.ends_with("/voyager/api/jobs/jobPostings/42"));
    assert!(exchange.ok);
    assert_eq!(exchange.status, 200);
    assert!(exchange.content_type.contains("json"));
    assert_eq!(exchange.body, body);
}

#[tokio::test]
async fn event_style_response_is_broadcast_and_callback_fires() {
    let server = MockServer::start().await;
    let body = json!({"elements": [{"applyCount": 7}]});
    mount_json(&server, "/voyager/api/search/jobs", body.clone()).await;

    let page = page_for(&server);
    let bus = ExchangeBus::default();
    let mut rx = bus.subscribe();
    page.install_tap(local_filter(page.origin()), bus).unwrap();

    let (tx, done) = oneshot::channel();
    page.send(
        HttpRequest::get(format!("{}/voyager/api/search/jobs", server.uri())),
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );
    let response = done.await.unwrap().expect("request ok");
    assert_eq!(response.status, 200);

    let exchange = next_exchange(&mut rx).await.expect("exchange broadcast");
    assert_eq!(exchange.body, body);
}

#[tokio::test]
async fn unparseable_body_is_skipped_but_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/voyager/api/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
        .mount(&server)
        .await;

    let page = page_for(&server);
    let bus = ExchangeBus::default();
    let mut rx = bus.subscribe();
    page.install_tap(local_filter(page.origin()), bus).unwrap();

    let response = page.fetch(HttpRequest::get("/voyager/api/broken")).await.unwrap();
    assert_eq!(response.text_lossy(), "not json");
    assert!(next_exchange(&mut rx).await.is_none());
}

#[tokio::test]
async fn uninteresting_urls_are_not_broadcast() {
    let server = MockServer::start().await;
    mount_json(&server, "/static/manifest.json", json!({"applies": 3})).await;

    let page = page_for(&server);
    let bus = ExchangeBus::default();
    let mut rx = bus.subscribe();
    page.install_tap(local_filter(page.origin()), bus).unwrap();

    page.fetch(HttpRequest::get("/static/manifest.json")).await.unwrap();
    assert!(next_exchange(&mut rx).await.is_none());
}

#[tokio::test]
async fn second_install_is_a_noop() {
    let server = MockServer::start().await;
    mount_json(&server, "/voyager/api/me", json!({"applies": 1})).await;

    let page = page_for(&server);
    let bus = ExchangeBus::default();
    let mut rx = bus.subscribe();
    assert_eq!(
        page.install_tap(local_filter(page.origin()), bus.clone()).unwrap(),
        TapInstall::Installed
    );
    assert_eq!(
        page.install_tap(local_filter(page.origin()), bus.clone()).unwrap(),
        TapInstall::AlreadyInstalled
    );
    assert!(page.is_tapped());

    page.fetch(HttpRequest::get("/voyager/api/me")).await.unwrap();
    assert!(next_exchange(&mut rx).await.is_some());
    assert!(next_exchange(&mut rx).await.is_none(), "observed twice");
}

struct FailingFetch;

#[async_trait::async_trait]
impl FetchPrimitive for FailingFetch {
    async fn fetch(&self, _request: HttpRequest) -> Result<HttpResponse, FetchError> {
        Err(FetchError::new(FailureKind::Network, "connection reset"))
    }
}

impl RequestObject for FailingFetch {
    fn send(&self, _request: HttpRequest, on_complete: applies_engine::CompletionCallback) {
        on_complete(Err(FetchError::new(FailureKind::Network, "connection reset")));
    }
}

#[tokio::test]
async fn transport_failures_pass_through_untouched() {
    let page = PageContext::new("https://www.linkedin.com/", Arc::new(FailingFetch), Arc::new(FailingFetch));
    let bus = ExchangeBus::default();
    let mut rx = bus.subscribe();
    page.install_tap(
        InterestFilter::new(FilterSettings::default(), page.origin()),
        bus,
    )
    .unwrap();

    let err = page
        .fetch(HttpRequest::get("/voyager/api/jobs/jobPostings/1"))
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::new(FailureKind::Network, "connection reset"));

    let (tx, done) = oneshot::channel();
    page.send(
        HttpRequest::get("/voyager/api/jobs/jobPostings/1"),
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );
    assert!(done.await.unwrap().is_err());
    assert!(next_exchange(&mut rx).await.is_none());
}

#[test]
fn install_needs_a_runtime() {
    let page = PageContext::new("https://www.linkedin.com/", Arc::new(FailingFetch), Arc::new(FailingFetch));
    let result = page.install_tap(
        InterestFilter::new(FilterSettings::default(), page.origin()),
        ExchangeBus::default(),
    );
    assert_eq!(result, Err(TapError::NoRuntime));
    assert!(!page.is_tapped());
}
