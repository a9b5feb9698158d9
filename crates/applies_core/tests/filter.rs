use applies_core::{FilterSettings, InterestFilter};

const ORIGIN: &str = "https://www.linkedin.com/jobs/search/?currentJobId=1";
const JSON: Option<&str> = Some("application/vnd.linkedin.normalized+json+2.1");

fn filter() -> InterestFilter {
    InterestFilter::new(FilterSettings::default(), ORIGIN)
}

#[test]
fn relative_api_urls_resolve_against_origin() {
    assert!(filter().accepts("/voyager/api/jobs/jobPostings/3900?topN=1", JSON));
}

#[test]
fn absolute_urls_on_subdomains_match() {
    let filter = filter();
    assert!(filter.accepts("https://www.linkedin.com/voyager/api/graphql", JSON));
    assert!(filter.accepts("https://linkedin.com/voyager/api/me", Some("application/json")));
}

#[test]
fn lookalike_hosts_are_rejected() {
    let filter = filter();
    assert!(!filter.matches_url("https://notlinkedin.com/voyager/api/x"));
    assert!(!filter.matches_url("https://linkedin.com.evil.net/voyager/api/x"));
    assert!(!filter.matches_url("//evil.example/voyager/api/x"));
}

#[test]
fn other_paths_are_rejected() {
    let filter = filter();
    assert!(!filter.matches_url("/feed/updates"));
    assert!(!filter.matches_url("https://www.linkedin.com/voyager/apix"));
    assert!(!filter.matches_url("https://www.linkedin.com/jobs/voyager/api/"));
}

#[test]
fn non_json_content_types_are_rejected() {
    let filter = filter();
    let url = "/voyager/api/jobs/jobPostings/1";
    assert!(!filter.accepts(url, Some("text/html; charset=utf-8")));
    assert!(!filter.accepts(url, Some("image/png")));
    assert!(!filter.accepts(url, None));
}

#[test]
fn malformed_urls_never_match() {
    let filter = filter();
    for raw in ["", "   ", "http://[::1", "javascript:alert(1)", "http://", "mailto:a@b.c"] {
        assert!(!filter.matches_url(raw), "{raw:?}");
        assert!(!filter.accepts(raw, JSON), "{raw:?}");
    }
}

#[test]
fn without_origin_only_absolute_urls_match() {
    let filter = InterestFilter::new(FilterSettings::default(), "not an origin");
    assert!(!filter.matches_url("/voyager/api/jobs/jobPostings/1"));
    assert!(filter.matches_url("https://www.linkedin.com/voyager/api/jobs/jobPostings/1"));
}

#[test]
fn custom_settings_change_the_target() {
    let settings = FilterSettings {
        target_domain: "example.com".to_string(),
        path_prefix: "/api/v2/".to_string(),
    };
    let filter = InterestFilter::new(settings, "https://jobs.example.com/");
    assert!(filter.accepts("/api/v2/postings/5", Some("application/json")));
    assert!(!filter.accepts("https://www.linkedin.com/voyager/api/x", Some("application/json")));
}
