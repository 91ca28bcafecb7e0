//! # Record Store Client Tests
//!
//! Exercises the CRUD client against wiremock servers to verify request
//! construction, response parsing, and error mapping without a live store.

use fundra_core::{Project, RecordId, Transaction};
use fundra_store::{RecordStore, StoreConfig, StoreError};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store(server: &MockServer) -> RecordStore {
    RecordStore::new(StoreConfig::new(server.uri()).with_timeout_secs(2)).expect("client build")
}

fn project_json(id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "ownerId": "u-1",
        "title": "Community Solar",
        "status": "active",
        "fundingGoal": 100000.0,
        "currentFunding": 100000.0,
        "createdAt": "2026-01-10T09:00:00Z",
    })
}

#[tokio::test]
async fn get_parses_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_json("p-1")))
        .expect(1)
        .mount(&server)
        .await;

    let project = store(&server)
        .project(&RecordId::new("p-1"))
        .await
        .expect("get project");
    assert_eq!(project.title, "Community Solar");
    assert_eq!(project.funding_goal, 100_000.0);
}

#[tokio::test]
async fn get_missing_record_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = store(&server)
        .project(&RecordId::new("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound { ref collection, ref id } if collection == "projects" && id == "ghost"
    ));
}

#[tokio::test]
async fn try_get_missing_record_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let found: Option<Project> = store(&server)
        .try_project(&RecordId::new("ghost"))
        .await
        .expect("try_get");
    assert!(found.is_none());
}

#[tokio::test]
async fn list_sends_equality_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rules"))
        .and(query_param("projectId", "p-1"))
        .and(query_param("active", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let rules = store(&server)
        .active_rules(&RecordId::new("p-1"))
        .await
        .expect("list rules");
    assert!(rules.is_empty());
}

#[tokio::test]
async fn create_posts_body_and_returns_assigned_id() {
    let server = MockServer::start().await;
    let tx = Transaction {
        id: None,
        project_id: RecordId::new("p-1"),
        investment_id: RecordId::new("i-1"),
        phase: "phase-1".into(),
        amount: 10_000.0,
        from_account: "escrow".into(),
        to_wallet: "0xabc".into(),
        note: None,
        created_at: chrono::DateTime::parse_from_rfc3339("2026-03-01T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc),
    };
    let mut created = serde_json::to_value(&tx).unwrap();
    created["id"] = serde_json::json!("t-77");

    Mock::given(method("POST"))
        .and(path("/transactions"))
        .and(body_json(serde_json::to_value(&tx).unwrap()))
        .respond_with(ResponseTemplate::new(201).set_body_json(created))
        .expect(1)
        .mount(&server)
        .await;

    let stored = store(&server)
        .record_transaction(&tx)
        .await
        .expect("create transaction");
    assert_eq!(stored.id, Some(RecordId::new("t-77")));
    assert_eq!(stored.amount, 10_000.0);
}

#[tokio::test]
async fn patch_merges_status() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/milestones/m-1"))
        .and(body_json(serde_json::json!({"status": "funded"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "m-1", "status": "funded"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let updated = store(&server)
        .patch_status("milestones", &RecordId::new("m-1"), "funded")
        .await
        .expect("patch status");
    assert_eq!(updated["status"], "funded");
}

#[tokio::test]
async fn server_error_maps_to_service_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/p-1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = store(&server)
        .project(&RecordId::new("p-1"))
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn client_error_maps_to_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/investments/i-1"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad schedule"))
        .mount(&server)
        .await;

    let err: StoreError = store(&server)
        .replace::<_, serde_json::Value>("investments", "i-1", &serde_json::json!({"id": "i-1"}))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Rejected { status: 422, ref body, .. } if body == "bad schedule"
    ));
}

#[tokio::test]
async fn malformed_body_maps_to_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = store(&server)
        .project(&RecordId::new("p-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Decode { .. }));
}
