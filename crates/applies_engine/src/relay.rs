//! Content relay: answers UI queries for the page it is attached to.
//!
//! It has no network access of its own. Fresh data is requested from the
//! page context over the window and awaited with a timeout.
use std::sync::Arc;
use std::time::Duration;

use applies_core::{
    is_jobs_page, subject_from_page_url, FetchOutcome, FetchRequest, SubjectId, UiQuery,
    UiResponse,
};
use applies_logging::{applies_debug, applies_info, applies_warn, ExecContext};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::bridge::{request_with_timeout, OutcomeRouter};
use crate::bus::WindowEvents;
use crate::dom::subject_from_dom;

pub const NO_RESPONSE_ERROR: &str = "No response";
const QUERY_QUEUE: usize = 16;

/// What the relay can see of its page: the URL and, when loaded, the markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    pub html: Option<String>,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// URL first, then markup.
    pub fn subject(&self) -> Option<SubjectId> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|url| subject_from_page_url(&url))
            .or_else(|| self.html.as_deref().and_then(subject_from_dom))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("Not a /jobs/ page")]
    NotJobsPage,
    #[error("No jobId on this page")]
    MissingJobId,
    #[error("{message}")]
    Transport { status: u16, message: String },
    #[error("Timeout")]
    Timeout,
    #[error("Invalid page url: {0}")]
    Parse(String),
}

pub struct ContentRelay {
    page: watch::Receiver<PageSnapshot>,
    router: Arc<OutcomeRouter>,
    window: WindowEvents,
    timeout: Duration,
    top_param: u32,
}

impl ContentRelay {
    pub fn new(
        page: watch::Receiver<PageSnapshot>,
        router: Arc<OutcomeRouter>,
        window: WindowEvents,
        timeout: Duration,
        top_param: u32,
    ) -> Self {
        Self {
            page,
            router,
            window,
            timeout,
            top_param,
        }
    }

    /// Navigation check, then subject resolution.
    pub fn current_subject(&self) -> Result<SubjectId, RelayError> {
        let snapshot = self.page.borrow().clone();
        let url = url::Url::parse(&snapshot.url).map_err(|err| RelayError::Parse(err.to_string()))?;
        if !is_jobs_page(&url) {
            return Err(RelayError::NotJobsPage);
        }
        snapshot.subject().ok_or(RelayError::MissingJobId)
    }

    pub async fn handle(&self, query: UiQuery) -> UiResponse {
        match query {
            UiQuery::GetJobDetails => self.job_details().await,
        }
    }

    async fn job_details(&self) -> UiResponse {
        let subject = match self.current_subject() {
            Ok(subject) => subject,
            Err(err) => {
                applies_debug!(ctx = ExecContext::Content; "query rejected: {}", err);
                return UiResponse::failure(err.to_string());
            }
        };

        let request = FetchRequest::new(&subject, self.top_param);
        let outcome = request_with_timeout(&self.router, &self.window, request, self.timeout).await;
        let auth_token_present = outcome.auth_token_present;

        match settle(outcome) {
            Ok((data, status)) => UiResponse::Success {
                data,
                status,
                auth_token_present,
                subject_id: subject.to_string(),
            },
            Err(RelayError::Timeout) => UiResponse::Failure {
                error: RelayError::Timeout.to_string(),
                status: Some(0),
                auth_token_present: None,
                subject_id: Some(subject.to_string()),
            },
            Err(err) => {
                applies_warn!(ctx = ExecContext::Content; "Fetch failed: {}", err);
                let status = match &err {
                    RelayError::Transport { status, .. } => *status,
                    _ => 0,
                };
                UiResponse::Failure {
                    error: err.to_string(),
                    status: Some(status),
                    auth_token_present: Some(auth_token_present),
                    subject_id: Some(subject.to_string()),
                }
            }
        }
    }

    /// Serve queries on a task until `shutdown` fires or every handle is gone.
    pub fn spawn(self, shutdown: CancellationToken) -> RelayHandle {
        let (tx, mut rx) = mpsc::channel::<(UiQuery, oneshot::Sender<UiResponse>)>(QUERY_QUEUE);
        let relay = Arc::new(self);
        tokio::spawn(async move {
            applies_info!(ctx = ExecContext::Content; "relay ready");
            loop {
                let next = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    next = rx.recv() => next,
                };
                let Some((query, reply)) = next else { break };
                let relay = relay.clone();
                tokio::spawn(async move {
                    let response = relay.handle(query).await;
                    if reply.send(response).is_err() {
                        applies_debug!(ctx = ExecContext::Content; "requester went away before the reply");
                    }
                });
            }
        });
        RelayHandle { tx }
    }
}

fn settle(outcome: FetchOutcome) -> Result<(Value, u16), RelayError> {
    if outcome.ok {
        return Ok((outcome.data.unwrap_or(Value::Null), outcome.status));
    }
    if outcome.is_timeout() {
        return Err(RelayError::Timeout);
    }
    Err(RelayError::Transport {
        status: outcome.status,
        message: outcome.error.unwrap_or_else(|| "Failed".to_string()),
    })
}

/// UI-side sender of queries to one relay.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<(UiQuery, oneshot::Sender<UiResponse>)>,
}

impl RelayHandle {
    pub async fn query(&self, query: UiQuery) -> UiResponse {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send((query, reply_tx)).await.is_err() {
            return UiResponse::failure(NO_RESPONSE_ERROR);
        }
        reply_rx
            .await
            .unwrap_or_else(|_| UiResponse::failure(NO_RESPONSE_ERROR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_prefers_url_over_markup() {
        let snapshot = PageSnapshot::new("https://www.linkedin.com/jobs/view/10/")
            .with_html(r#"<div data-job-id="20"></div>"#);
        assert_eq!(snapshot.subject().unwrap().as_str(), "10");

        let snapshot = PageSnapshot::new("https://www.linkedin.com/jobs/collections/recommended/")
            .with_html(r#"<div data-job-id="20"></div>"#);
        assert_eq!(snapshot.subject().unwrap().as_str(), "20");
    }

    #[test]
    fn settle_maps_outcomes() {
        assert_eq!(settle(FetchOutcome::timeout()), Err(RelayError::Timeout));
        assert_eq!(
            settle(FetchOutcome::failure("HTTP 403", 403, true)),
            Err(RelayError::Transport {
                status: 403,
                message: "HTTP 403".into()
            })
        );
        assert_eq!(
            settle(FetchOutcome::success(serde_json::json!({"a": 1}), 200, true)),
            Ok((serde_json::json!({"a": 1}), 200))
        );
    }

    #[test]
    fn error_texts_are_user_facing() {
        assert_eq!(RelayError::NotJobsPage.to_string(), "Not a /jobs/ page");
        assert_eq!(RelayError::MissingJobId.to_string(), "No jobId on this page");
    }
}
