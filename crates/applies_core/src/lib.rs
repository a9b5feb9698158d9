//! Applies core: pure filtering, extraction and normalization logic.
mod badge;
mod cache;
mod extract;
mod filter;
mod format;
mod insights;
mod messages;
mod subject;

pub use badge::{is_jobs_url, BadgeState};
pub use cache::{cache_key, subject_from_cache_key, AppliesBoard, CacheEntry, CACHE_KEY_PREFIX};
pub use extract::{
    extract_count, is_count_key, short_digit_run, ExtractionResult, MatchSource, EXACT_PATHS,
    FALLBACK_CEILING,
};
pub use filter::{
    is_structured_content_type, FilterSettings, InterestFilter, DEFAULT_API_PREFIX,
    DEFAULT_TARGET_DOMAIN,
};
pub use format::{format_currency, format_date, format_percent, format_with_commas};
pub use insights::{
    build_insights, detokenize, last_urn_token, map_workplace_types, Advanced, Dates, Field,
    JobInsights, Overview, Salary, UNAVAILABLE,
};
pub use messages::{
    CapturedExchange, FetchOutcome, FetchRequest, PageEvent, UiQuery, UiResponse,
    MISSING_SUBJECT_ERROR, TIMEOUT_ERROR,
};
pub use subject::{
    is_jobs_page, subject_from_api_url, subject_from_page_url, subject_from_query, subject_from_urn,
    subject_from_view_path, SubjectId, JOBS_PATH_PREFIX,
};
