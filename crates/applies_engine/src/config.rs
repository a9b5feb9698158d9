use std::path::PathBuf;
use std::time::Duration;

use applies_core::FilterSettings;
use serde::{Deserialize, Serialize};

use crate::primitives::FetchSettings;

pub const DEFAULT_PAGE_URL: &str = "https://www.linkedin.com/jobs/";

/// Everything the engine needs to attach to one page.
///
/// Durations are whole seconds so the struct reads naturally from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// URL of the page the engine is attached to. Its origin resolves
    /// relative request URLs.
    pub page_url: String,
    pub filter: FilterSettings,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub outcome_timeout_secs: u64,
    /// BCP 47 tag; `None` falls back to `en_US`.
    pub locale: Option<String>,
    pub top_param: u32,
    /// Page cookie string, as the page itself would see it.
    pub cookie: Option<String>,
    /// Where the applies cache lives; `None` keeps it in memory only.
    pub cache_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            filter: FilterSettings::default(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            outcome_timeout_secs: 12,
            locale: None,
            top_param: 1,
            cookie: None,
            cache_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn outcome_timeout(&self) -> Duration {
        Duration::from_secs(self.outcome_timeout_secs)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            cookie: self.cookie.clone(),
            ..FetchSettings::default()
        }
    }

    /// `scheme://host[:port]/` of [`EngineConfig::page_url`], or the URL
    /// itself when it does not parse.
    pub fn origin(&self) -> String {
        match url::Url::parse(&self.page_url) {
            Ok(url) => format!("{}/", url.origin().ascii_serialization()),
            Err(_) => self.page_url.clone(),
        }
    }
}
