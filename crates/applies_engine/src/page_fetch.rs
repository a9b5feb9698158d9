//! Job-posting fetcher living in the page context.
//!
//! Answers every [`PageEvent::DirectFetch`] on the window with exactly one
//! [`PageEvent::DirectResult`] carrying the same id.
use std::sync::Arc;

use applies_core::{FetchOutcome, FetchRequest, PageEvent, MISSING_SUBJECT_ERROR};
use applies_logging::{applies_debug, applies_error, applies_info, applies_warn, ExecContext};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::WindowEvents;
use crate::tap::PageContext;
use crate::HttpRequest;

pub const POSTING_ENDPOINT: &str = "/voyager/api/jobs/jobPostings/";
pub const SESSION_COOKIE: &str = "JSESSIONID";
pub const DEFAULT_LOCALE_HEADER: &str = "en_US";
const ERROR_SNIPPET_CHARS: usize = 300;

/// Builds authenticated posting requests from the page's session cookie.
#[derive(Debug, Clone, Default)]
pub struct JobPostingClient {
    cookie: Option<String>,
    locale: Option<String>,
}

impl JobPostingClient {
    /// `cookie` is the page's cookie string (`a=1; b=2`), `locale` a BCP 47
    /// tag such as `de-DE`.
    pub fn new(cookie: Option<String>, locale: Option<String>) -> Self {
        Self { cookie, locale }
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.cookie.as_deref().and_then(csrf_token_from_cookie)
    }

    pub fn language_header(&self) -> String {
        match self.locale.as_deref().map(str::trim) {
            Some(locale) if !locale.is_empty() => locale.replacen('-', "_", 1),
            _ => DEFAULT_LOCALE_HEADER.to_string(),
        }
    }

    /// Relative to the page origin, like any request page code issues.
    pub fn posting_url(subject_id: &str, top_param: u32) -> String {
        let encoded = utf8_percent_encode(subject_id, NON_ALPHANUMERIC);
        format!("{POSTING_ENDPOINT}{encoded}?topN={top_param}")
    }

    pub fn build_request(&self, request: &FetchRequest) -> HttpRequest {
        HttpRequest::get(Self::posting_url(&request.subject_id, request.top_param))
            .header("csrf-token", self.csrf_token().unwrap_or_default())
            .header("accept", "application/json")
            .header("x-restli-protocol-version", "2.0.0")
            .header("x-li-lang", self.language_header())
    }

    /// Always produces an outcome; transport, status and body failures are
    /// folded into `ok: false`.
    pub async fn fetch_outcome(&self, page: &PageContext, request: &FetchRequest) -> FetchOutcome {
        let csrf_present = self.csrf_token().is_some();
        if request.subject_id.trim().is_empty() {
            return FetchOutcome::failure(MISSING_SUBJECT_ERROR, 0, csrf_present);
        }
        if !csrf_present {
            applies_warn!(ctx = ExecContext::Page; "missing {} cookie", SESSION_COOKIE);
        }

        let response = match page.fetch(self.build_request(request)).await {
            Ok(response) => response,
            Err(err) => {
                applies_error!(ctx = ExecContext::Page; "posting fetch failed: {}", err);
                return FetchOutcome::failure(err.to_string(), 0, csrf_present);
            }
        };

        let status = response.status;
        if !response.ok() {
            let text = response.text_lossy();
            let snippet: String = text.chars().take(ERROR_SNIPPET_CHARS).collect();
            applies_error!(ctx = ExecContext::Page; "fetch failed: {} {}", status, snippet);
            return FetchOutcome::failure(format!("HTTP {status}"), status, csrf_present);
        }

        match serde_json::from_slice(&response.body) {
            Ok(data) => FetchOutcome::success(data, status, csrf_present),
            Err(err) => {
                applies_error!(ctx = ExecContext::Page; "posting body is not JSON: {}", err);
                FetchOutcome::failure(format!("Invalid JSON: {err}"), status, csrf_present)
            }
        }
    }
}

/// `JSESSIONID` value, percent-decoded, one pair of surrounding quotes removed.
pub fn csrf_token_from_cookie(cookie: &str) -> Option<String> {
    let raw = cookie.split(';').find_map(|part| {
        let (name, value) = part.trim_start().split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })?;
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let token = decoded.strip_prefix('"').unwrap_or(&decoded);
    let token = token.strip_suffix('"').unwrap_or(token);
    (!token.is_empty()).then(|| token.to_string())
}

/// Serves fetch requests arriving on the page window.
pub struct PageFetchService {
    page: Arc<PageContext>,
    client: Arc<JobPostingClient>,
    window: WindowEvents,
}

impl PageFetchService {
    pub fn new(page: Arc<PageContext>, client: JobPostingClient, window: WindowEvents) -> Self {
        Self {
            page,
            client: Arc::new(client),
            window,
        }
    }

    /// Subscribes immediately; the returned future runs until `shutdown`
    /// fires or the window closes.
    pub fn serve(self, shutdown: CancellationToken) -> impl std::future::Future<Output = ()> + Send {
        let events = self.window.subscribe();
        self.run(events, shutdown)
    }

    async fn run(self, mut events: broadcast::Receiver<PageEvent>, shutdown: CancellationToken) {
        applies_info!(ctx = ExecContext::Page; "posting fetcher listening on {}", self.page.origin());
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => event,
            };
            match event {
                Ok(PageEvent::DirectFetch { id, detail }) => {
                    applies_debug!(ctx = ExecContext::Page; "fetch request {} for posting {:?}", id, detail.subject_id);
                    let page = self.page.clone();
                    let client = self.client.clone();
                    let window = self.window.clone();
                    tokio::spawn(async move {
                        let outcome = client.fetch_outcome(&page, &detail).await;
                        window.dispatch(PageEvent::DirectResult { id, detail: outcome });
                    });
                }
                Ok(PageEvent::DirectResult { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    applies_warn!(ctx = ExecContext::Page; "fetcher lagged, {} event(s) skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
