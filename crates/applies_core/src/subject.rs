use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

const JOB_ID_QUERY_PARAM: &str = "currentJobId";
const VIEW_PATH_MARKER: &str = "/jobs/view/";
const POSTING_PATH_MARKER: &str = "/jobPostings/";
const POSTING_URN_MARKER: &str = "urn:li:jobPosting:";
pub const JOBS_PATH_PREFIX: &str = "/jobs/";

/// Site-assigned numeric identifier of a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Accepts a non-empty run of ASCII digits only.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit());
        valid.then(|| SubjectId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True when the page is somewhere under `/jobs/`.
pub fn is_jobs_page(page: &Url) -> bool {
    page.path().starts_with(JOBS_PATH_PREFIX)
}

/// `?currentJobId=<id>` first, then `/jobs/view/<id>` in the path.
pub fn subject_from_page_url(page: &Url) -> Option<SubjectId> {
    subject_from_query(page).or_else(|| subject_from_view_path(page.path()))
}

pub fn subject_from_query(page: &Url) -> Option<SubjectId> {
    page.query_pairs()
        .find(|(key, _)| key == JOB_ID_QUERY_PARAM)
        .and_then(|(_, value)| SubjectId::parse(&value))
}

pub fn subject_from_view_path(path: &str) -> Option<SubjectId> {
    digits_after_marker(path, VIEW_PATH_MARKER, true)
}

pub fn subject_from_urn(text: &str) -> Option<SubjectId> {
    digits_after_marker(text, POSTING_URN_MARKER, false)
}

/// Subject a captured API exchange is about: `/jobPostings/<id>`, or a
/// (possibly percent-encoded) posting URN anywhere in the URL.
pub fn subject_from_api_url(url: &str) -> Option<SubjectId> {
    let decoded = url.replace("%3A", ":").replace("%3a", ":");
    digits_after_marker(&decoded, POSTING_PATH_MARKER, false)
        .or_else(|| subject_from_urn(&decoded))
}

fn digits_after_marker(text: &str, marker: &str, ignore_case: bool) -> Option<SubjectId> {
    let start = if ignore_case {
        text.to_ascii_lowercase().find(&marker.to_ascii_lowercase())?
    } else {
        text.find(marker)?
    };
    let rest = &text[start + marker.len()..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    SubjectId::parse(&rest[..end])
}
