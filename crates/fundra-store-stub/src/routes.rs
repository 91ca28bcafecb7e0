// SPDX-License-Identifier: BUSL-1.1
//! Route definitions for the record store stub.
//!
//! Implements the generic CRUD contract `fundra-store` calls: list with
//! equality query filters, get by id, create with id assignment, full
//! replace, and shallow-merge patch. Responses are the stored camelCase
//! JSON, untouched.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::store::AppState;

/// Build the complete router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/:collection", get(list).post(create))
        .route("/:collection/:id", get(get_one).put(replace).patch(merge))
        .fallback(not_found)
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "no such route"})),
    )
        .into_response()
}

fn unknown_collection(name: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": format!("unknown collection {name:?}")})),
    )
        .into_response()
}

fn missing_record(collection: &str, id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": format!("no record {collection}/{id}")})),
    )
        .into_response()
}

/// Equality comparison between a record field and a query string value.
/// Non-string fields (numbers, booleans) compare against their JSON text.
fn field_matches(field: Option<&Value>, expected: &str) -> bool {
    match field {
        Some(Value::String(s)) => s == expected,
        Some(other) => other.to_string() == expected,
        None => false,
    }
}

// ── Collection routes ───────────────────────────────────────────────

async fn list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(filters): Query<HashMap<String, String>>,
) -> Response {
    let Some(records) = state.collection(&collection) else {
        return unknown_collection(&collection);
    };

    let mut matched: Vec<Value> = records
        .iter()
        .filter(|entry| {
            filters
                .iter()
                .all(|(field, expected)| field_matches(entry.value().get(field), expected))
        })
        .map(|entry| entry.value().clone())
        .collect();

    // Deterministic order for clients and tests.
    matched.sort_by(|a, b| {
        let a_id = a.get("id").and_then(Value::as_str).unwrap_or("");
        let b_id = b.get("id").and_then(Value::as_str).unwrap_or("");
        a_id.cmp(b_id)
    });

    Json(matched).into_response()
}

async fn create(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    let Some(records) = state.collection(&collection) else {
        return unknown_collection(&collection);
    };
    let Some(fields) = body.as_object_mut() else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "record body must be a JSON object"})),
        )
            .into_response();
    };

    let id = match fields.get("id").and_then(Value::as_str) {
        Some(given) => given.to_string(),
        None => {
            let assigned = Uuid::new_v4().to_string();
            fields.insert("id".into(), json!(assigned));
            assigned
        }
    };

    records.insert(id, body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn get_one(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let Some(records) = state.collection(&collection) else {
        return unknown_collection(&collection);
    };
    let response = match records.get(&id) {
        Some(record) => Json(record.value().clone()).into_response(),
        None => missing_record(&collection, &id),
    };
    response
}

async fn replace(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(mut body): Json<Value>,
) -> Response {
    let Some(records) = state.collection(&collection) else {
        return unknown_collection(&collection);
    };
    if !records.contains_key(&id) {
        return missing_record(&collection, &id);
    }
    if let Some(fields) = body.as_object_mut() {
        fields.insert("id".into(), json!(id));
    }
    records.insert(id, body.clone());
    Json(body).into_response()
}

async fn merge(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(patch): Json<Value>,
) -> Response {
    let Some(records) = state.collection(&collection) else {
        return unknown_collection(&collection);
    };
    let Some(mut record) = records.get_mut(&id) else {
        return missing_record(&collection, &id);
    };

    // Shallow merge under the entry's write lock.
    if let (Some(existing), Some(incoming)) = (record.value_mut().as_object_mut(), patch.as_object())
    {
        for (field, value) in incoming {
            existing.insert(field.clone(), value.clone());
        }
    }
    Json(record.value().clone()).into_response()
}
