use applies_core::{FetchOutcome, FetchRequest, PageEvent, SubjectId, UiQuery, UiResponse};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn ui_query_uses_type_tag() {
    let wire = serde_json::to_value(UiQuery::GetJobDetails).unwrap();
    assert_eq!(wire, json!({ "type": "GET_JOB_DETAILS" }));

    let parsed: UiQuery = serde_json::from_value(json!({ "type": "GET_JOB_DETAILS" })).unwrap();
    assert_eq!(parsed, UiQuery::GetJobDetails);
    assert!(serde_json::from_value::<UiQuery>(json!({ "type": "JOBS_CONTEXT_PING" })).is_err());
}

#[test]
fn fetch_request_uses_wire_names() {
    let subject = SubjectId::parse("3900").unwrap();
    let event = PageEvent::DirectFetch {
        id: 7,
        detail: FetchRequest::new(&subject, 1),
    };
    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        json!({ "type": "DIRECT_FETCH", "id": 7, "detail": { "jobId": "3900", "topN": 1 } })
    );
}

#[test]
fn timeout_outcome_shape() {
    let outcome = FetchOutcome::timeout();
    assert!(outcome.is_timeout());
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({ "ok": false, "error": "Timeout", "status": 0, "csrfPresent": false })
    );
}

#[test]
fn ui_success_flattens_to_ok_true() {
    let response = UiResponse::Success {
        data: json!({ "applies": 4 }),
        status: 200,
        auth_token_present: true,
        subject_id: "3900".to_string(),
    };
    let wire = serde_json::to_value(&response).unwrap();
    assert_eq!(
        wire,
        json!({
            "ok": true,
            "data": { "applies": 4 },
            "status": 200,
            "csrfPresent": true,
            "jobId": "3900"
        })
    );
    let back: UiResponse = serde_json::from_value(wire).unwrap();
    assert_eq!(back, response);
}

#[test]
fn ui_failure_keeps_only_known_fields() {
    let response = UiResponse::failure("No jobId on this page");
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "ok": false, "error": "No jobId on this page" })
    );
    assert!(!response.is_ok());
    assert_eq!(response.subject_id(), None);
}
