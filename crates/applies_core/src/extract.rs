use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Known direct paths, tried in order before any heuristic search.
pub const EXACT_PATHS: &[&[&str]] = &[&["data", "applies"], &["applies"]];

/// Unkeyed scalars are only plausible counts below this bound.
pub const FALLBACK_CEILING: f64 = 1_000_000.0;

const MAX_DIGIT_RUN: usize = 6;

/// Lower-cased fragments that mark a key as an applicant-count field.
const COUNT_KEY_FRAGMENTS: &[&str] = &[
    "applies",
    "applicant",
    "applications",
    "applicationcount",
    "application_count",
    "applycount",
    "apply_count",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchSource {
    /// One of [`EXACT_PATHS`] resolved.
    ExactPath,
    /// A key recognised as count terminology.
    Keyed,
    /// An unkeyed scalar in the plausible range.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub value: Option<f64>,
    pub source_key_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MatchSource>,
}

impl ExtractionResult {
    fn found(value: f64, hint: String, source: MatchSource) -> Self {
        Self {
            value: Some(value),
            source_key_hint: Some(hint),
            source: Some(source),
        }
    }

    pub fn is_found(&self) -> bool {
        self.value.is_some()
    }

    /// The value as a whole count, rounded to the nearest integer.
    pub fn count(&self) -> Option<u64> {
        self.value.map(|v| v.round() as u64)
    }
}

/// Locate the most likely applicant-count field in `body`.
///
/// Exact paths win outright. Otherwise keyed matches are searched level by
/// level so a shallower key always beats a deeper one, and only when no keyed
/// match exists anywhere is the first plausible unkeyed scalar returned.
/// Absence is a normal outcome and yields `value: None`.
pub fn extract_count(body: &Value) -> ExtractionResult {
    if let Some(result) = exact_path_lookup(body) {
        return result;
    }
    if let Some(result) = keyed_search(body) {
        return result;
    }
    if let Some((value, hint)) = fallback_search(body, "") {
        return ExtractionResult::found(value, hint, MatchSource::Fallback);
    }
    ExtractionResult::default()
}

fn exact_path_lookup(body: &Value) -> Option<ExtractionResult> {
    EXACT_PATHS.iter().find_map(|path| {
        let mut node = body;
        for segment in path.iter() {
            node = node.as_object()?.get(*segment)?;
        }
        let value = accept_keyed(node)?;
        Some(ExtractionResult::found(
            value,
            path.join("."),
            MatchSource::ExactPath,
        ))
    })
}

/// Level-order walk: every key of every object at depth `n` is checked for a
/// direct match before anything at depth `n + 1`.
fn keyed_search(body: &Value) -> Option<ExtractionResult> {
    let mut frontier: Vec<(&Value, String)> = vec![(body, String::new())];
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for (node, path) in frontier {
            match node {
                Value::Object(map) => {
                    if let Some((key, value)) = direct_keyed_match(map) {
                        return Some(ExtractionResult::found(
                            value,
                            join_key(&path, key),
                            MatchSource::Keyed,
                        ));
                    }
                    for (key, child) in map {
                        if is_container(child) {
                            next.push((child, join_key(&path, key)));
                        }
                    }
                }
                Value::Array(items) => {
                    for (index, child) in items.iter().enumerate() {
                        if is_container(child) {
                            next.push((child, join_index(&path, index)));
                        }
                    }
                }
                _ => {}
            }
        }
        frontier = next;
    }
    None
}

fn direct_keyed_match(map: &Map<String, Value>) -> Option<(&str, f64)> {
    map.iter()
        .filter(|(key, _)| is_count_key(key))
        .find_map(|(key, value)| accept_keyed(value).map(|v| (key.as_str(), v)))
}

/// Depth-first, document order; the first plausible scalar ends the walk.
fn fallback_search(node: &Value, path: &str) -> Option<(f64, String)> {
    match node {
        Value::Number(number) => number
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0 && *v < FALLBACK_CEILING)
            .map(|v| (v, path.to_string())),
        Value::String(text) => short_digit_run(text).map(|v| (v as f64, path.to_string())),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(index, child)| fallback_search(child, &join_index(path, index))),
        Value::Object(map) => map
            .iter()
            .find_map(|(key, child)| fallback_search(child, &join_key(path, key))),
        Value::Null | Value::Bool(_) => None,
    }
}

/// Accept a value found under a count-like key.
fn accept_keyed(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|v| v.is_finite() && *v >= 0.0),
        Value::String(text) => short_digit_run(text).map(|v| v as f64),
        _ => None,
    }
}

pub fn is_count_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    COUNT_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
}

/// First contiguous run of ASCII digits, accepted only when 1..=6 long.
pub fn short_digit_run(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let run = &rest[..end];
    if run.len() > MAX_DIGIT_RUN {
        return None;
    }
    run.parse().ok()
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn join_index(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

#[cfg(test)]
mod tests {
    use super::{is_count_key, short_digit_run};

    #[test]
    fn count_keys_cover_common_spellings() {
        for key in [
            "applies",
            "numApplies",
            "totalApplicants",
            "APPLICANT_COUNT",
            "applicationsCount",
            "applyCount",
        ] {
            assert!(is_count_key(key), "{key} should match");
        }
    }

    #[test]
    fn unrelated_keys_do_not_match() {
        for key in ["views", "applied", "applyMethod", "applicationDeadlineAt", "apple"] {
            assert!(!is_count_key(key), "{key} should not match");
        }
    }

    #[test]
    fn digit_runs_are_capped_at_six() {
        assert_eq!(short_digit_run("7 people"), Some(7));
        assert_eq!(short_digit_run("Over 200 applicants"), Some(200));
        assert_eq!(short_digit_run("999999"), Some(999_999));
        assert_eq!(short_digit_run("1234567"), None);
        assert_eq!(short_digit_run("no digits"), None);
    }
}
