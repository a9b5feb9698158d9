//! Display-ready view of a raw job-posting payload.
//!
//! [`build_insights`] never fails: each field is derived on its own and falls
//! back to [`Field::Unavailable`] when its inputs are missing or malformed.
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::format::{format_currency, format_date, format_percent, DEFAULT_CURRENCY};

/// Glyph rendered for [`Field::Unavailable`].
pub const UNAVAILABLE: &str = "—";

const OFFSITE_APPLY_KEY: &str = "com.linkedin.voyager.jobs.OffsiteApply";

/// Workplace-type codes with a known label.
const WORKPLACE_TYPE_LABELS: &[(&str, &str)] = &[("1", "On-site"), ("2", "Remote"), ("3", "Hybrid")];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "value")]
pub enum Field<T> {
    Available(T),
    Unavailable,
}

impl<T> Field<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Field::Available(_))
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Field::Available(value) => Some(value),
            Field::Unavailable => None,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Field::Unavailable, Field::Available)
    }
}

impl<T: fmt::Display> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Available(value) => value.fmt(f),
            Field::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInsights {
    pub overview: Overview,
    pub salary: Salary,
    pub dates: Dates,
    pub advanced: Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub applies: Field<f64>,
    pub views: Field<f64>,
    pub apply_rate: Field<String>,
    pub remote_text: Field<String>,
    pub offsite_url: Field<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Salary {
    pub text: Field<String>,
    pub min: Field<f64>,
    pub max: Field<f64>,
    pub monthly: Field<String>,
    pub employer_provided: Field<bool>,
    pub currency: Field<String>,
    pub period: Field<String>,
}

impl Salary {
    pub fn has_any(&self) -> bool {
        self.text.is_available()
            || self.min.is_available()
            || self.max.is_available()
            || self.monthly.is_available()
            || self.employer_provided.is_available()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dates {
    pub posted: Field<String>,
    pub expires: Field<String>,
    pub deadline: Field<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advanced {
    pub job_state: Field<String>,
    pub listing_type: Field<String>,
    pub sponsored: Field<String>,
    pub you_applied: Field<String>,
    pub closed: Field<String>,
    pub remote_allowed: Field<String>,
    pub workplace_types: Field<String>,
    pub employment: Field<String>,
    pub job_functions: Field<String>,
    pub industries: Field<String>,
}

pub fn build_insights(data: &Value) -> JobInsights {
    let remote_allowed = data
        .get("workRemoteAllowed")
        .is_some_and(is_truthy);

    JobInsights {
        overview: build_overview(data, remote_allowed),
        salary: build_salary(data),
        dates: Dates {
            posted: data.get("listedAt").and_then(format_date).into(),
            expires: data.get("expireAt").and_then(format_date).into(),
            deadline: first_present(data, &["applicationDeadlineAt", "applicationCloseDate"])
                .and_then(format_date)
                .into(),
        },
        advanced: Advanced {
            job_state: first_present(data, &["jobState", "jobPostingState"])
                .and_then(non_empty_str)
                .into(),
            listing_type: data.get("listingType").and_then(non_empty_str).into(),
            sponsored: yes_no(data.get("sponsored")),
            you_applied: yes_no(data.get("applied")),
            closed: yes_no(data.get("closed")),
            remote_allowed: yes_no(data.get("workRemoteAllowed")),
            workplace_types: map_workplace_types(data.get("workplaceTypes"), remote_allowed).into(),
            employment: data.get("employmentType").and_then(non_empty_str).into(),
            job_functions: label_list(data.get("formattedJobFunctions")).into(),
            industries: label_list(data.get("formattedIndustries")).into(),
        },
    }
}

fn build_overview(data: &Value, remote_allowed: bool) -> Overview {
    let applies = data.get("applies").and_then(finite_number);
    let views = data.get("views").and_then(finite_number);
    let apply_rate = match (applies, views) {
        (Some(applies), Some(views)) if views > 0.0 => format_percent(applies / views),
        _ => None,
    };
    let offsite_url = data
        .get("applyMethod")
        .and_then(|method| method.get(OFFSITE_APPLY_KEY))
        .and_then(|offsite| offsite.get("companyApplyUrl"))
        .and_then(non_empty_str);

    Overview {
        applies: applies.into(),
        views: views.into(),
        apply_rate: apply_rate.into(),
        remote_text: remote_allowed.then(|| "Remote allowed".to_string()).into(),
        offsite_url: offsite_url.into(),
    }
}

fn build_salary(data: &Value) -> Salary {
    let formatted = data
        .get("formattedSalaryDescription")
        .and_then(non_empty_str);
    let insights = data.get("salaryInsights");
    let employer_provided = insights
        .and_then(|si| si.get("providedByEmployer"))
        .and_then(Value::as_bool);

    let base = insights
        .and_then(|si| si.get("compensationBreakdown"))
        .and_then(Value::as_array)
        .and_then(|entries| {
            entries
                .iter()
                .find(|entry| {
                    entry.get("compensationType").and_then(Value::as_str) == Some("BASE_SALARY")
                })
                .or_else(|| entries.first())
        });

    let min = base.and_then(|b| b.get("minSalary")).and_then(lenient_number);
    let max = base.and_then(|b| b.get("maxSalary")).and_then(lenient_number);
    let currency = base
        .and_then(|b| b.get("currencyCode"))
        .and_then(non_empty_str);
    let period = base.and_then(|b| b.get("payPeriod")).and_then(non_empty_str);

    // Zero bounds count as absent for the derived texts.
    let lower = min.filter(|v| *v != 0.0);
    let upper = max.filter(|v| *v != 0.0);
    let unit = currency.as_deref().unwrap_or(DEFAULT_CURRENCY);

    let text = formatted.or_else(|| {
        if lower.is_none() && upper.is_none() {
            return None;
        }
        let per = if period.as_deref() == Some("MONTHLY") { "/mo" } else { "/yr" };
        let mut parts = Vec::with_capacity(3);
        if let Some(text) = lower.and_then(|v| format_currency(v, unit)) {
            parts.push(text);
        }
        parts.push("–".to_string());
        if let Some(text) = upper.and_then(|v| format_currency(v, unit)) {
            parts.push(text);
        }
        Some(format!("{}{per}", parts.join(" ")))
    });

    let monthly = match (period.as_deref(), lower.or(upper), upper.or(lower)) {
        (Some("YEARLY"), Some(low), Some(high)) => {
            let average = (low + high) / 2.0;
            format_currency((average / 12.0).round(), unit).map(|text| format!("{text}/mo"))
        }
        _ => None,
    };

    Salary {
        text: text.into(),
        min: min.into(),
        max: max.into(),
        monthly: monthly.into(),
        employer_provided: employer_provided.into(),
        currency: currency.into(),
        period: period.into(),
    }
}

/// Human labels for workplace-type entries, deduplicated in first-seen order.
pub fn map_workplace_types(list: Option<&Value>, remote_allowed: bool) -> Option<String> {
    let items = list.and_then(Value::as_array).filter(|items| !items.is_empty());
    let Some(items) = items else {
        return remote_allowed.then(|| "Remote allowed".to_string());
    };

    let labels = items.iter().map(|item| match item {
        Value::String(text) if !text.starts_with("urn:") => text.clone(),
        Value::String(urn) => workplace_label_for_urn(urn),
        other => {
            let raw = scalar_text(other);
            lookup_workplace_label(&raw)
                .map(str::to_string)
                .unwrap_or(raw)
        }
    });
    let unique = dedup_in_order(labels);
    (!unique.is_empty()).then(|| unique.join(", "))
}

fn workplace_label_for_urn(urn: &str) -> String {
    match last_urn_token(urn) {
        Some(token) => lookup_workplace_label(token)
            .map(str::to_string)
            .or_else(|| detokenize(token))
            .unwrap_or_else(|| urn.to_string()),
        None => urn.to_string(),
    }
}

fn lookup_workplace_label(code: &str) -> Option<&'static str> {
    WORKPLACE_TYPE_LABELS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, label)| *label)
}

/// Token after the last `:` when it is made of `[A-Za-z0-9_-]`.
pub fn last_urn_token(urn: &str) -> Option<&str> {
    let (_, token) = urn.rsplit_once(':')?;
    let valid = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some(token)
}

/// Generic fallback for unknown codes: `enm-full-time` -> `full time`.
pub fn detokenize(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return Some(token.to_string());
    }
    let stripped = token.strip_prefix("enm-").unwrap_or(token);
    Some(stripped.replace('-', " "))
}

fn label_list(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let unique = dedup_in_order(
                items
                    .iter()
                    .filter_map(non_empty_str),
            );
            (!unique.is_empty()).then(|| unique.join(", "))
        }
        _ => None,
    }
}

fn dedup_in_order(labels: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for label in labels {
        if !unique.contains(&label) {
            unique.push(label);
        }
    }
    unique
}

fn yes_no(value: Option<&Value>) -> Field<String> {
    match value {
        None | Some(Value::Null) => Field::Unavailable,
        Some(other) => Field::Available(if is_truthy(other) { "yes" } else { "no" }.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|v| v != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_present<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| data.get(*key))
        .find(|value| !value.is_null())
}

fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

/// Numbers, or strings holding a number.
fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(_) => finite_number(value),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
