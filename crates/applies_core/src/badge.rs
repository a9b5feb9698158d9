use url::Url;

use crate::subject::is_jobs_page;

pub const BADGE_TEXT: &str = "!";
pub const BADGE_COLOR: &str = "#0a66c2";
pub const BADGE_TEXT_COLOR: &str = "#ffffff";
pub const ACTIVE_TITLE: &str = "LinkedIn Jobs detected — click to open insights";
pub const IDLE_TITLE: &str = "LinkedIn Job Insights";

const JOBS_HOST_SUFFIX: &str = "linkedin.com";

/// Toolbar badge shown for a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeState {
    /// A job posting is selected on the tab.
    Active,
    Cleared,
}

impl BadgeState {
    pub fn for_tab_url(url: &str) -> Self {
        if is_jobs_url(url) {
            BadgeState::Active
        } else {
            BadgeState::Cleared
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            BadgeState::Active => BADGE_TEXT,
            BadgeState::Cleared => "",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            BadgeState::Active => ACTIVE_TITLE,
            BadgeState::Cleared => IDLE_TITLE,
        }
    }

    pub fn colors(self) -> Option<(&'static str, &'static str)> {
        match self {
            BadgeState::Active => Some((BADGE_COLOR, BADGE_TEXT_COLOR)),
            BadgeState::Cleared => None,
        }
    }
}

/// Job board host, a `/jobs/` path and a selected posting.
pub fn is_jobs_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    parsed
        .host_str()
        .is_some_and(|host| host.ends_with(JOBS_HOST_SUFFIX))
        && is_jobs_page(&parsed)
        && parsed.query_pairs().any(|(key, _)| key == "currentJobId")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_page_with_selection_activates_badge() {
        let state =
            BadgeState::for_tab_url("https://www.linkedin.com/jobs/search/?currentJobId=3900");
        assert_eq!(state, BadgeState::Active);
        assert_eq!(state.text(), "!");
        assert_eq!(state.colors(), Some((BADGE_COLOR, BADGE_TEXT_COLOR)));
    }

    #[test]
    fn other_pages_clear_badge() {
        for url in [
            "https://www.linkedin.com/feed/",
            "https://www.linkedin.com/jobs/search/",
            "https://example.com/jobs/?currentJobId=1",
            "not a url",
        ] {
            let state = BadgeState::for_tab_url(url);
            assert_eq!(state, BadgeState::Cleared, "{url}");
            assert_eq!(state.title(), IDLE_TITLE);
        }
    }
}
