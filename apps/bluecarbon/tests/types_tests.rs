//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use bluecarbon::api::{
    AddFilesRequest, DraftPatch, ErrorResponse, HealthResponse, IssueRequest, PurchaseRequest,
    PurchaseResponse, RetireRequest, ReviewRequest, StatusResponse, StepResponse,
};
use bluecarbon_core::{FileKind, ProjectDraft, ProjectId, ProjectType, TxHash};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.3.1".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert!(json.contains("\"status\":\"ok\""));
    assert!(json.contains("\"version\":\"0.3.1\""));
}

// =============================================================================
// STATUS RESPONSE TESTS
// =============================================================================

#[test]
fn test_status_response_round_trip() {
    let status = StatusResponse {
        project_count: 4,
        pending_reviews: 1,
        credits_issued: 6700,
        credits_retired: 100,
    };

    let json = serde_json::to_string(&status).unwrap();
    let parsed: StatusResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.project_count, 4);
    assert_eq!(parsed.pending_reviews, 1);
    assert_eq!(parsed.credits_issued, 6700);
    assert_eq!(parsed.credits_retired, 100);
}

// =============================================================================
// REVIEW REQUEST TESTS
// =============================================================================

#[test]
fn test_review_request_approve_deserialization() {
    let json = r#"{"decision":"approve"}"#;
    let request: ReviewRequest = serde_json::from_str(json).unwrap();
    assert!(matches!(request, ReviewRequest::Approve { notes: None }));
}

#[test]
fn test_review_request_reject_with_notes() {
    let json = r#"{"decision":"reject","notes":"evidence is stale"}"#;
    let request: ReviewRequest = serde_json::from_str(json).unwrap();
    match request {
        ReviewRequest::Reject { notes } => {
            assert_eq!(notes.as_deref(), Some("evidence is stale"));
        }
        ReviewRequest::Approve { .. } => panic!("expected reject"),
    }
}

#[test]
fn test_review_request_unknown_decision_fails() {
    let json = r#"{"decision":"maybe"}"#;
    assert!(serde_json::from_str::<ReviewRequest>(json).is_err());
}

#[test]
fn test_issue_request_deserialization() {
    let json = r#"{"price_per_credit":25}"#;
    let request: IssueRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.price_per_credit, 25);
}

// =============================================================================
// MARKET REQUEST/RESPONSE TESTS
// =============================================================================

#[test]
fn test_purchase_request_deserialization() {
    let json = r#"{"project_id":3,"amount":150}"#;
    let request: PurchaseRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.project_id, ProjectId(3));
    assert_eq!(request.amount, 150);
}

#[test]
fn test_purchase_response_omits_absent_fields() {
    let response = PurchaseResponse {
        success: true,
        tx_hash: Some(TxHash::new("0xfeed")),
        new_balance: 42,
        error: None,
    };

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"tx_hash\""));
    assert!(!json.contains("\"error\""));
}

#[test]
fn test_retire_request_deserialization() {
    let json = r#"{"project_id":1,"amount":50,"reason":"Fleet offsets"}"#;
    let request: RetireRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.amount, 50);
    assert_eq!(request.reason, "Fleet offsets");
}

// =============================================================================
// WIZARD TYPE TESTS
// =============================================================================

#[test]
fn test_draft_patch_applies_only_present_fields() {
    let json = r#"{"name":"Reef Lagoon","estimated_credits":500}"#;
    let patch: DraftPatch = serde_json::from_str(json).unwrap();

    let mut draft = ProjectDraft {
        description: "keep me".to_string(),
        ..ProjectDraft::default()
    };
    patch.apply(&mut draft);

    assert_eq!(draft.name, "Reef Lagoon");
    assert_eq!(draft.estimated_credits, 500);
    assert_eq!(draft.description, "keep me");
    assert_eq!(draft.project_type, ProjectType::Mangrove);
}

#[test]
fn test_draft_patch_empty_object_is_noop() {
    let patch: DraftPatch = serde_json::from_str("{}").unwrap();
    let mut draft = ProjectDraft::default();
    patch.apply(&mut draft);
    assert_eq!(draft, ProjectDraft::default());
}

#[test]
fn test_add_files_request_deserialization() {
    let json = r#"{
        "kind": "evidence",
        "files": [{"name": "site.jpg", "content_base64": "aGVsbG8="}]
    }"#;
    let request: AddFilesRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.kind, FileKind::Evidence);
    assert_eq!(request.files.len(), 1);
    assert_eq!(request.files[0].name, "site.jpg");
}

#[test]
fn test_step_response_serialization() {
    let step = StepResponse {
        step: 2,
        step_label: "Upload Files".to_string(),
    };
    let json = serde_json::to_string(&step).unwrap();
    assert!(json.contains("\"step\":2"));
    assert!(json.contains("\"step_label\":\"Upload Files\""));
}

// =============================================================================
// ERROR RESPONSE TESTS
// =============================================================================

#[test]
fn test_error_response_construction() {
    let error = ErrorResponse::new("something broke");
    let json = serde_json::to_string(&error).unwrap();
    assert_eq!(json, r#"{"error":"something broke"}"#);
}
