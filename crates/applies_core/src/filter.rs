use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_TARGET_DOMAIN: &str = "linkedin.com";
pub const DEFAULT_API_PREFIX: &str = "/voyager/api/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Host that must match exactly or as a parent domain.
    pub target_domain: String,
    /// Path prefix identifying the API family worth parsing.
    pub path_prefix: String,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            target_domain: DEFAULT_TARGET_DOMAIN.to_string(),
            path_prefix: DEFAULT_API_PREFIX.to_string(),
        }
    }
}

/// Cheap gate deciding whether a captured exchange is worth parsing.
///
/// Pure predicate: no side effects, never panics on malformed input.
#[derive(Debug, Clone)]
pub struct InterestFilter {
    settings: FilterSettings,
    origin: Option<Url>,
}

impl InterestFilter {
    /// `page_origin` is the URL relative request URLs are resolved against.
    /// An unparseable origin leaves only absolute URLs matchable.
    pub fn new(settings: FilterSettings, page_origin: &str) -> Self {
        Self {
            settings,
            origin: Url::parse(page_origin).ok(),
        }
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    pub fn accepts(&self, url: &str, content_type: Option<&str>) -> bool {
        self.matches_url(url) && content_type.is_some_and(is_structured_content_type)
    }

    pub fn matches_url(&self, url: &str) -> bool {
        match self.resolve(url) {
            Some(resolved) => {
                self.host_matches(&resolved)
                    && resolved.path().starts_with(&self.settings.path_prefix)
            }
            None => false,
        }
    }

    /// Resolve `raw` against the page origin; absolute URLs pass through.
    pub fn resolve(&self, raw: &str) -> Option<Url> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let url = match Url::parse(trimmed) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self.origin.as_ref()?.join(trimmed).ok()?,
            Err(_) => return None,
        };
        matches!(url.scheme(), "http" | "https").then_some(url)
    }

    fn host_matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let domain = self.settings.target_domain.to_ascii_lowercase();
        host == domain
            || host
                .strip_suffix(domain.as_str())
                .is_some_and(|rest| rest.ends_with('.'))
    }
}

/// True when the declared media type is a JSON flavour
/// (`application/json`, `application/vnd.linkedin.normalized+json+2.1`, ...).
pub fn is_structured_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    essence.contains("json")
}

#[cfg(test)]
mod tests {
    use super::is_structured_content_type;

    #[test]
    fn json_variants_are_structured() {
        assert!(is_structured_content_type("application/json"));
        assert!(is_structured_content_type("application/json; charset=utf-8"));
        assert!(is_structured_content_type(
            "application/vnd.linkedin.normalized+json+2.1"
        ));
        assert!(is_structured_content_type("TEXT/JSON"));
    }

    #[test]
    fn other_media_types_are_rejected() {
        assert!(!is_structured_content_type("text/html"));
        assert!(!is_structured_content_type("image/png"));
        assert!(!is_structured_content_type("text/plain; note=json"));
        assert!(!is_structured_content_type(""));
    }
}
