//! Subject id from page markup, for pages whose URL does not carry it.
use applies_core::{subject_from_urn, subject_from_view_path, SubjectId};
use scraper::{Html, Selector};

const JOB_ID_ATTR: &str = "data-job-id";
const ENTITY_URN_ATTR: &str = "data-entity-urn";

/// First `[data-job-id]` with a numeric value, then the first posting URN
/// attribute, then the first job view link. Only the first element matching
/// each marker is considered.
pub fn subject_from_dom(html: &str) -> Option<SubjectId> {
    let document = Html::parse_document(html);

    first_attr(&document, "[data-job-id]", JOB_ID_ATTR)
        .and_then(|value| SubjectId::parse(&value))
        .or_else(|| {
            first_attr(
                &document,
                r#"[data-entity-urn*="urn:li:jobPosting:"]"#,
                ENTITY_URN_ATTR,
            )
            .and_then(|urn| subject_from_urn(&urn))
        })
        .or_else(|| {
            first_attr(&document, r#"a[href*="/jobs/view/"]"#, "href")
                .and_then(|href| subject_from_view_path(&href))
        })
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_attribute_wins() {
        let html = r#"<div data-entity-urn="urn:li:jobPosting:2"></div><div data-job-id="1"></div>"#;
        assert_eq!(subject_from_dom(html).unwrap().as_str(), "1");
    }

    #[test]
    fn non_numeric_data_attribute_falls_through_to_urn() {
        let html = r#"<div data-job-id="abc"></div>
            <section data-entity-urn="urn:li:jobPosting:3901234567"></section>"#;
        assert_eq!(subject_from_dom(html).unwrap().as_str(), "3901234567");
    }

    #[test]
    fn view_link_is_last_resort() {
        let html = r#"<a href="/jobs/view/555/?trk=x">Open</a><a href="/jobs/view/666/">Other</a>"#;
        assert_eq!(subject_from_dom(html).unwrap().as_str(), "555");
    }

    #[test]
    fn nothing_on_page() {
        assert_eq!(subject_from_dom("<p>hello</p>"), None);
    }
}
