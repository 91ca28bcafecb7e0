//! # Engine Scenario Tests
//!
//! Drives the full runner pipeline against a wiremock record store:
//! context loading, condition gating, phase release with check-and-set,
//! transaction and notification writes, and the audit trail.

use std::sync::Arc;

use fundra_core::RecordId;
use fundra_engine::{ActionOutcome, EngineError, ProjectRuleRunner, ProviderRegistry};
use fundra_store::{RecordStore, StoreConfig};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn runner(server: &MockServer) -> ProjectRuleRunner {
    let store =
        RecordStore::new(StoreConfig::new(server.uri()).with_timeout_secs(2)).expect("client");
    ProjectRuleRunner::new(store, Arc::new(ProviderRegistry::new()))
}

fn project_json() -> serde_json::Value {
    json!({
        "id": "p-1",
        "ownerId": "u-1",
        "title": "Community Solar",
        "status": "active",
        "fundingGoal": 100000.0,
        "currentFunding": 100000.0,
        "createdAt": "2026-01-10T09:00:00Z",
    })
}

fn investment_json(phase1_released: bool) -> serde_json::Value {
    json!({
        "id": "i-1",
        "projectId": "p-1",
        "investorId": "u-2",
        "amount": 40000.0,
        "status": "active",
        "createdAt": "2026-01-15T09:00:00Z",
        "disbursementPhases": [
            {
                "phase": "phase-1",
                "amount": 10000.0,
                "condition": "25% on funding goal",
                "released": phase1_released,
            },
            {
                "phase": "phase-2",
                "amount": 30000.0,
                "condition": "remainder on completion",
                "released": false,
            },
        ],
    })
}

fn release_rule_json(actions: serde_json::Value) -> serde_json::Value {
    json!([{
        "id": "r-1",
        "projectId": "p-1",
        "name": "Release 25% at full funding",
        "active": true,
        "targetType": "investment",
        "targetIds": ["i-1"],
        "conditions": [
            {"type": "project-funding", "percentage": 100.0, "required": true},
        ],
        "actions": actions,
    }])
}

fn evaluation_response() -> serde_json::Value {
    json!({
        "id": "ev-1",
        "ruleId": "r-1",
        "projectId": "p-1",
        "evaluatedAt": "2026-03-01T00:00:00Z",
        "conditionResults": [],
        "conditionsMet": 1,
        "conditionsTotal": 1,
        "passed": true,
    })
}

/// Mount the reads every run performs: project, rules, milestones,
/// verifications, investments.
async fn mount_project_reads(
    server: &MockServer,
    rules: serde_json::Value,
    investments: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path("/projects/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_json()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rules"))
        .and(query_param("projectId", "p-1"))
        .and(query_param("active", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rules))
        .mount(server)
        .await;
    for collection in ["milestones", "verifications"] {
        Mock::given(method("GET"))
            .and(path(format!("/{collection}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/investments"))
        .and(query_param("projectId", "p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(investments))
        .mount(server)
        .await;
}

async fn mount_audit_write(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/evaluations"))
        .respond_with(ResponseTemplate::new(201).set_body_json(evaluation_response()))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn funded_project_releases_matching_phase() {
    let server = MockServer::start().await;
    mount_project_reads(
        &server,
        release_rule_json(json!([{"type": "release-funds", "percentage": 25.0}])),
        json!([investment_json(false)]),
    )
    .await;
    mount_audit_write(&server, 1).await;

    // Owner wallet resolution for the default "project-owner" target.
    Mock::given(method("GET"))
        .and(path("/users/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u-1",
            "name": "Pat Creator",
            "role": "creator",
            "walletAddress": "0xOWNER",
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Check-and-set fresh read.
    Mock::given(method("GET"))
        .and(path("/investments/i-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(investment_json(false)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/investments/i-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(investment_json(true)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "t-1",
            "projectId": "p-1",
            "investmentId": "i-1",
            "phase": "phase-1",
            "amount": 10000.0,
            "fromAccount": "escrow",
            "toWallet": "0xOWNER",
            "createdAt": "2026-03-01T00:00:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcomes = runner(&server)
        .run_for_project(&RecordId::new("p-1"))
        .await
        .expect("run");

    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert!(outcome.passed);
    assert!(outcome.audit_recorded);
    assert_eq!(outcome.target_id, Some(RecordId::new("i-1")));
    assert_eq!(outcome.action_results.len(), 1);
    match &outcome.action_results[0].outcome {
        ActionOutcome::Succeeded { detail } => {
            assert_eq!(detail["releasedAmount"], 10000.0);
            assert_eq!(detail["phase"], "phase-1");
            assert_eq!(detail["toWallet"], "0xOWNER");
            assert_eq!(detail["transactionId"], "t-1");
        }
        other => panic!("expected success, got {other:?}"),
    }

    // The PUT body must carry the released phase with a release date, and
    // leave the other phase untouched.
    let requests = server.received_requests().await.expect("recording");
    let put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .expect("investment PUT");
    let body: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
    assert_eq!(body["disbursementPhases"][0]["released"], true);
    assert!(body["disbursementPhases"][0]["releaseDate"].is_string());
    assert_eq!(body["disbursementPhases"][1]["released"], false);

    let tx_post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST" && r.url.path() == "/transactions")
        .expect("transaction POST");
    let tx: serde_json::Value = serde_json::from_slice(&tx_post.body).unwrap();
    assert_eq!(tx["amount"], 10000.0);
    assert_eq!(tx["fromAccount"], "escrow");
    assert_eq!(tx["toWallet"], "0xOWNER");
}

#[tokio::test]
async fn rerun_after_release_fails_without_duplicate_transaction() {
    let server = MockServer::start().await;
    // phase-1 already released in the snapshot: matching finds nothing.
    mount_project_reads(
        &server,
        release_rule_json(json!([{"type": "release-funds", "percentage": 25.0}])),
        json!([investment_json(true)]),
    )
    .await;
    mount_audit_write(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/investments/i-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let outcomes = runner(&server)
        .run_for_project(&RecordId::new("p-1"))
        .await
        .expect("run");

    let outcome = &outcomes[0];
    // The rule itself still passed and was audited; only the action failed.
    assert!(outcome.passed);
    assert!(outcome.audit_recorded);
    match &outcome.action_results[0].outcome {
        ActionOutcome::Failed { error } => {
            assert!(error.contains("no unreleased disbursement phase"), "{error}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_release_detected_at_write_time() {
    let server = MockServer::start().await;
    // Snapshot shows the phase unreleased…
    mount_project_reads(
        &server,
        release_rule_json(json!([{"type": "release-funds", "percentage": 25.0}])),
        json!([investment_json(false)]),
    )
    .await;
    mount_audit_write(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/users/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u-1",
            "name": "Pat Creator",
            "role": "creator",
            "walletAddress": "0xOWNER",
        })))
        .mount(&server)
        .await;

    // …but the fresh read says another run released it in between.
    Mock::given(method("GET"))
        .and(path("/investments/i-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(investment_json(true)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/investments/i-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let outcomes = runner(&server)
        .run_for_project(&RecordId::new("p-1"))
        .await
        .expect("run");

    match &outcomes[0].action_results[0].outcome {
        ActionOutcome::Failed { error } => {
            assert!(error.contains("released concurrently"), "{error}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn transaction_write_failure_surfaces_audit_gap() {
    let server = MockServer::start().await;
    mount_project_reads(
        &server,
        release_rule_json(json!([{"type": "release-funds", "amount": 10000.0}])),
        json!([investment_json(false)]),
    )
    .await;
    mount_audit_write(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/users/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u-1",
            "name": "Pat Creator",
            "role": "creator",
            "walletAddress": "0xOWNER",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/investments/i-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(investment_json(false)))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/investments/i-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(investment_json(true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("ledger down"))
        .expect(1)
        .mount(&server)
        .await;

    let outcomes = runner(&server)
        .run_for_project(&RecordId::new("p-1"))
        .await
        .expect("run");

    match &outcomes[0].action_results[0].outcome {
        ActionOutcome::ReleasedWithAuditGap { release, error } => {
            assert_eq!(release.amount, 10_000.0);
            assert_eq!(release.phase, "phase-1");
            assert!(release.transaction_id.is_none());
            assert!(error.contains("failed to record the transaction"), "{error}");
        }
        other => panic!("expected audit gap, got {other:?}"),
    }
}

#[tokio::test]
async fn notify_writes_one_notification_per_recipient() {
    let server = MockServer::start().await;
    mount_project_reads(
        &server,
        json!([{
            "id": "r-2",
            "projectId": "p-1",
            "name": "Announce funding",
            "active": true,
            "targetType": "project",
            "conditions": [
                {"type": "project-funding", "percentage": 100.0, "required": true},
            ],
            "actions": [
                {"type": "notify", "targets": ["project_owner", "admin"], "template": "funds_released"},
            ],
        }]),
        json!([]),
    )
    .await;
    mount_audit_write(&server, 1).await;

    // Two admins plus the owner → three notifications.
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("role", "admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "u-8", "name": "Admin A", "role": "admin"},
            {"id": "u-9", "name": "Admin B", "role": "admin"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/notifications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "n-1",
            "userId": "u-1",
            "template": "funds_released",
            "message": "x",
            "read": false,
            "createdAt": "2026-03-01T00:00:00Z",
        })))
        .expect(3)
        .mount(&server)
        .await;

    let outcomes = runner(&server)
        .run_for_project(&RecordId::new("p-1"))
        .await
        .expect("run");

    match &outcomes[0].action_results[0].outcome {
        ActionOutcome::Succeeded { detail } => {
            assert_eq!(detail["recipientCount"], 3);
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn milestone_rule_with_missing_target_is_skipped() {
    let server = MockServer::start().await;
    mount_project_reads(
        &server,
        json!([{
            "id": "r-3",
            "projectId": "p-1",
            "name": "Rule for a future milestone",
            "active": true,
            "targetType": "milestone",
            "targetIds": ["m-does-not-exist"],
            "conditions": [
                {"type": "project-funding", "percentage": 1.0, "required": true},
            ],
            "actions": [],
        }]),
        json!([]),
    )
    .await;
    // No target resolves → no evaluation, no audit record.
    mount_audit_write(&server, 0).await;

    let outcomes = runner(&server)
        .run_for_project(&RecordId::new("p-1"))
        .await
        .expect("run");
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn failed_rule_rerun_is_idempotent() {
    let server = MockServer::start().await;
    mount_project_reads(
        &server,
        json!([{
            "id": "r-4",
            "projectId": "p-1",
            "name": "Needs verifications",
            "active": true,
            "targetType": "project",
            "conditions": [
                {"type": "verification-count", "minimumCount": 5, "required": true},
            ],
            "actions": [
                {"type": "release-funds", "amount": 10000.0},
            ],
        }]),
        json!([investment_json(false)]),
    )
    .await;
    // Two runs → two audit records with identical condition results.
    mount_audit_write(&server, 2).await;

    let runner = runner(&server);
    let first = runner
        .run_for_project(&RecordId::new("p-1"))
        .await
        .expect("first run");
    let second = runner
        .run_for_project(&RecordId::new("p-1"))
        .await
        .expect("second run");

    for outcomes in [&first, &second] {
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].passed);
        assert!(outcomes[0].action_results.is_empty());
    }
    assert_eq!(first[0].condition_results, second[0].condition_results);
}

#[tokio::test]
async fn missing_project_aborts_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = runner(&server)
        .run_for_project(&RecordId::new("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ProjectNotFound { .. }));
}

#[tokio::test]
async fn update_status_patches_the_scoped_entity() {
    let server = MockServer::start().await;
    mount_project_reads(
        &server,
        json!([{
            "id": "r-5",
            "projectId": "p-1",
            "name": "Mark investment disbursing",
            "active": true,
            "targetType": "investment",
            "targetIds": ["i-1"],
            "conditions": [
                {"type": "project-funding", "percentage": 100.0, "required": true},
            ],
            "actions": [
                {"type": "update-status", "entity": "investment", "status": "disbursing"},
            ],
        }]),
        json!([investment_json(false)]),
    )
    .await;
    mount_audit_write(&server, 1).await;

    Mock::given(method("PATCH"))
        .and(path("/investments/i-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "i-1", "status": "disbursing"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcomes = runner(&server)
        .run_for_project(&RecordId::new("p-1"))
        .await
        .expect("run");

    match &outcomes[0].action_results[0].outcome {
        ActionOutcome::Succeeded { detail } => {
            assert_eq!(detail["entity"], "investments");
            assert_eq!(detail["status"], "disbursing");
        }
        other => panic!("expected success, got {other:?}"),
    }

    let requests = server.received_requests().await.expect("recording");
    let patch = requests
        .iter()
        .find(|r| r.method.as_str() == "PATCH")
        .expect("PATCH request");
    let body: serde_json::Value = serde_json::from_slice(&patch.body).unwrap();
    assert_eq!(body, json!({"status": "disbursing"}));
}

#[tokio::test]
async fn one_failing_action_does_not_stop_the_next() {
    let server = MockServer::start().await;
    mount_project_reads(
        &server,
        release_rule_json(json!([
            // Sized to nothing in the schedule → PhaseNotFound.
            {"type": "release-funds", "amount": 7777.0},
            {"type": "notify", "targets": ["project_owner"], "template": "funds_released"},
        ])),
        json!([investment_json(false)]),
    )
    .await;
    mount_audit_write(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/notifications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "n-1",
            "userId": "u-1",
            "template": "funds_released",
            "message": "x",
            "read": false,
            "createdAt": "2026-03-01T00:00:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcomes = runner(&server)
        .run_for_project(&RecordId::new("p-1"))
        .await
        .expect("run");

    let results = &outcomes[0].action_results;
    assert_eq!(results.len(), 2);
    assert!(matches!(results[0].outcome, ActionOutcome::Failed { .. }));
    assert!(results[1].outcome.is_success());
}
