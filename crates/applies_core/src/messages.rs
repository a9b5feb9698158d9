//! Messages crossing execution-context boundaries.
//!
//! Every hop carries an owned value; nothing is shared between contexts.
//! Each direction has its own schema, and the serde names are the wire names.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SubjectId;

pub const TIMEOUT_ERROR: &str = "Timeout";
pub const MISSING_SUBJECT_ERROR: &str = "Missing jobId";

/// One observed response that passed the interest filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedExchange {
    pub url: String,
    pub ok: bool,
    pub status: u16,
    pub content_type: String,
    pub body: Value,
}

/// Request for fresh data about one subject, sent toward the context that has
/// network access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    #[serde(rename = "jobId")]
    pub subject_id: String,
    #[serde(rename = "topN", default = "default_top_param")]
    pub top_param: u32,
}

fn default_top_param() -> u32 {
    1
}

impl FetchRequest {
    pub fn new(subject: &SubjectId, top_param: u32) -> Self {
        Self {
            subject_id: subject.as_str().to_string(),
            top_param,
        }
    }
}

/// Exactly one per [`FetchRequest`]: delivered, or synthesized on timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub status: u16,
    #[serde(rename = "csrfPresent", default)]
    pub auth_token_present: bool,
}

impl FetchOutcome {
    pub fn success(data: Value, status: u16, auth_token_present: bool) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            status,
            auth_token_present,
        }
    }

    pub fn failure(error: impl Into<String>, status: u16, auth_token_present: bool) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
            status,
            auth_token_present,
        }
    }

    pub fn timeout() -> Self {
        Self::failure(TIMEOUT_ERROR, 0, false)
    }

    pub fn is_timeout(&self) -> bool {
        !self.ok && self.error.as_deref() == Some(TIMEOUT_ERROR)
    }
}

/// Events on the page window shared by the relay and the page context.
///
/// `id` pairs an outcome with the request that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageEvent {
    DirectFetch { id: u64, detail: FetchRequest },
    DirectResult { id: u64, detail: FetchOutcome },
}

/// Queries from the UI to the relay of the active tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiQuery {
    GetJobDetails,
}

/// Answer to [`UiQuery::GetJobDetails`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "UiResponseWire", from = "UiResponseWire")]
pub enum UiResponse {
    Success {
        data: Value,
        status: u16,
        auth_token_present: bool,
        subject_id: String,
    },
    Failure {
        error: String,
        status: Option<u16>,
        auth_token_present: Option<bool>,
        subject_id: Option<String>,
    },
}

impl UiResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        UiResponse::Failure {
            error: error.into(),
            status: None,
            auth_token_present: None,
            subject_id: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, UiResponse::Success { .. })
    }

    pub fn subject_id(&self) -> Option<&str> {
        match self {
            UiResponse::Success { subject_id, .. } => Some(subject_id),
            UiResponse::Failure { subject_id, .. } => subject_id.as_deref(),
        }
    }
}

/// Flat `{ ok, data | error, status, csrfPresent, jobId }` shape on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiResponseWire {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    csrf_present: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    job_id: Option<String>,
}

impl From<UiResponse> for UiResponseWire {
    fn from(response: UiResponse) -> Self {
        match response {
            UiResponse::Success {
                data,
                status,
                auth_token_present,
                subject_id,
            } => UiResponseWire {
                ok: true,
                data: Some(data),
                error: None,
                status: Some(status),
                csrf_present: Some(auth_token_present),
                job_id: Some(subject_id),
            },
            UiResponse::Failure {
                error,
                status,
                auth_token_present,
                subject_id,
            } => UiResponseWire {
                ok: false,
                data: None,
                error: Some(error),
                status,
                csrf_present: auth_token_present,
                job_id: subject_id,
            },
        }
    }
}

impl From<UiResponseWire> for UiResponse {
    fn from(wire: UiResponseWire) -> Self {
        if wire.ok {
            UiResponse::Success {
                data: wire.data.unwrap_or(Value::Null),
                status: wire.status.unwrap_or(0),
                auth_token_present: wire.csrf_present.unwrap_or(false),
                subject_id: wire.job_id.unwrap_or_default(),
            }
        } else {
            UiResponse::Failure {
                error: wire.error.unwrap_or_else(|| "Failed".to_string()),
                status: wire.status,
                auth_token_present: wire.csrf_present,
                subject_id: wire.job_id,
            }
        }
    }
}
