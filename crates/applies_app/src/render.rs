//! Plain-text views for the terminal.
use std::fmt::Write;

use applies_core::{
    format_currency, format_with_commas, BadgeState, CacheEntry, ExtractionResult, Field,
    JobInsights, UiResponse, UNAVAILABLE,
};
use chrono::{TimeZone, Utc};

const DEFAULT_CURRENCY: &str = "EUR";

pub fn render_insights(insights: &JobInsights, subject_id: &str) -> String {
    let mut out = String::new();
    let overview = &insights.overview;

    let _ = writeln!(out, "jobId: {subject_id}");
    let _ = writeln!(out, "Applies      {}", count(&overview.applies));
    let _ = writeln!(out, "Views        {}", count(&overview.views));
    let _ = writeln!(out, "Apply rate   {}", overview.apply_rate);
    let _ = writeln!(out, "Remote       {}", overview.remote_text);
    if let Some(url) = overview.offsite_url.as_option() {
        let _ = writeln!(out, "Apply at     {url}");
    }

    let salary = &insights.salary;
    if salary.has_any() {
        let currency = salary
            .currency
            .as_option()
            .map(String::as_str)
            .unwrap_or(DEFAULT_CURRENCY);
        let money = |field: &Field<f64>| {
            field
                .as_option()
                .and_then(|amount| format_currency(*amount, currency))
                .unwrap_or_else(|| UNAVAILABLE.to_string())
        };
        let source = match salary.employer_provided.as_option() {
            Some(true) => "Provided by employer",
            Some(false) => "Estimate",
            None => UNAVAILABLE,
        };
        let period = salary
            .period
            .as_option()
            .map(|period| format!(" · {}", period.to_lowercase()))
            .unwrap_or_default();

        let _ = writeln!(out, "\nSalary");
        let _ = writeln!(out, "  Range      {}", salary.text);
        let _ = writeln!(out, "  Min        {}", money(&salary.min));
        let _ = writeln!(out, "  Max        {}", money(&salary.max));
        let _ = writeln!(out, "  Monthly    {}", salary.monthly);
        let _ = writeln!(out, "  Source     {source}");
        let _ = writeln!(
            out,
            "  Currency   {}{period}",
            salary.currency.as_option().map(String::as_str).unwrap_or("-")
        );
    }

    let dates = &insights.dates;
    let _ = writeln!(out, "\nDates");
    let _ = writeln!(out, "  Posted     {}", dates.posted);
    let _ = writeln!(out, "  Expires    {}", dates.expires);
    let _ = writeln!(out, "  Deadline   {}", dates.deadline);

    let advanced = &insights.advanced;
    let _ = writeln!(out, "\nAdvanced");
    let _ = writeln!(out, "  State      {}", advanced.job_state);
    let _ = writeln!(out, "  Listing    {}", advanced.listing_type);
    let _ = writeln!(out, "  Sponsored  {}", advanced.sponsored);
    let _ = writeln!(out, "  Applied    {}", advanced.you_applied);
    let _ = writeln!(out, "  Closed     {}", advanced.closed);
    let _ = writeln!(out, "  Remote     {}", advanced.remote_allowed);
    let _ = writeln!(out, "  Workplace  {}", advanced.workplace_types);
    let _ = writeln!(out, "  Employment {}", advanced.employment);
    let _ = writeln!(out, "  Functions  {}", advanced.job_functions);
    let _ = writeln!(out, "  Industries {}", advanced.industries);
    out
}

pub fn render_failure(response: &UiResponse) -> String {
    match response {
        UiResponse::Failure {
            error, subject_id, ..
        } => match subject_id {
            Some(id) => format!("{error} (jobId: {id})"),
            None => error.clone(),
        },
        UiResponse::Success { .. } => String::new(),
    }
}

pub fn render_extraction(result: &ExtractionResult) -> String {
    match (result.count(), result.source_key_hint.as_deref()) {
        (Some(value), Some(hint)) => format!("{} (from {hint})", format_with_commas(value)),
        (Some(value), None) => format_with_commas(value),
        (None, _) => "No applicant count found".to_string(),
    }
}

pub fn render_cache(entries: &[(String, CacheEntry)]) -> String {
    if entries.is_empty() {
        return "No cached counts\n".to_string();
    }
    let mut out = String::new();
    for (key, entry) in entries {
        let at = Utc
            .timestamp_millis_opt(entry.at)
            .single()
            .map(|time| time.to_rfc3339())
            .unwrap_or_else(|| entry.at.to_string());
        let _ = writeln!(out, "{key}  {}  {at}  {}", entry.applies, entry.url);
    }
    out
}

pub fn render_badge(state: BadgeState) -> String {
    match state.colors() {
        Some((background, text)) => format!(
            "[{}] {} (badge {background}, text {text})",
            state.text(),
            state.title()
        ),
        None => state.title().to_string(),
    }
}

fn count(field: &Field<f64>) -> String {
    match field.as_option() {
        Some(value) if *value >= 0.0 => format_with_commas(value.round() as u64),
        _ => UNAVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use applies_core::{build_insights, extract_count};
    use serde_json::json;

    #[test]
    fn empty_posting_renders_placeholders() {
        let text = render_insights(&build_insights(&json!({})), "1");
        assert!(text.contains("Applies      —"));
        assert!(text.contains("Deadline   —"));
        assert!(!text.contains("Salary"));
    }

    #[test]
    fn counts_get_separators() {
        let text = render_insights(&build_insights(&json!({"applies": 1234, "views": 56789})), "9");
        assert!(text.contains("Applies      1,234"));
        assert!(text.contains("Views        56,789"));
    }

    #[test]
    fn extraction_mentions_source() {
        let result = extract_count(&json!({"data": {"applies": 1500}}));
        assert_eq!(render_extraction(&result), "1,500 (from data.applies)");
        assert_eq!(render_extraction(&extract_count(&json!({}))), "No applicant count found");
    }

    #[test]
    fn failure_shows_subject_when_known() {
        assert_eq!(
            render_failure(&UiResponse::failure("Not a /jobs/ page")),
            "Not a /jobs/ page"
        );
        let timeout = UiResponse::Failure {
            error: "Timeout".to_string(),
            status: Some(0),
            auth_token_present: None,
            subject_id: Some("12".to_string()),
        };
        assert_eq!(render_failure(&timeout), "Timeout (jobId: 12)");
    }

    #[test]
    fn cache_lines_show_iso_time() {
        let entries = vec![(
            "applies:1".to_string(),
            CacheEntry {
                applies: 4.0,
                at: 0,
                url: "u".to_string(),
            },
        )];
        assert!(render_cache(&entries).starts_with("applies:1  4  1970-01-01T00:00:00+00:00  u"));
    }
}
