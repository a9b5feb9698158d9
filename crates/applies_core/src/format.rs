use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

pub const DEFAULT_CURRENCY: &str = "EUR";

/// Epoch values above this are milliseconds, below it seconds.
const EPOCH_MS_THRESHOLD: f64 = 1e12;

/// `12345.4, "USD"` -> `"12,345 USD"`. No fractional digits.
pub fn format_currency(amount: f64, currency: &str) -> Option<String> {
    if !amount.is_finite() {
        return None;
    }
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    Some(format!(
        "{sign}{} {currency}",
        format_with_commas(rounded.abs() as u64)
    ))
}

/// `0.125` -> `"12.5%"`, `0.1` -> `"10%"`.
pub fn format_percent(ratio: f64) -> Option<String> {
    if !ratio.is_finite() {
        return None;
    }
    let text = format!("{:.1}", ratio * 100.0);
    let text = text.strip_suffix(".0").unwrap_or(&text);
    Some(format!("{text}%"))
}

/// Medium date style, e.g. `Jan 5, 2025`.
pub fn format_date(value: &Value) -> Option<String> {
    to_datetime(value).map(|dt| dt.format("%b %-d, %Y").to_string())
}

pub fn to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(number) => {
            let raw = number.as_f64().filter(|v| v.is_finite())?;
            let millis = if raw > EPOCH_MS_THRESHOLD {
                raw
            } else {
                raw * 1000.0
            };
            DateTime::from_timestamp_millis(millis as i64)
        }
        Value::String(text) => {
            let text = text.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Some(parsed.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        _ => None,
    }
}

pub fn format_with_commas(value: u64) -> String {
    let mut out = String::new();
    for (i, ch) in value.to_string().chars().rev().enumerate() {
        if i != 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}
