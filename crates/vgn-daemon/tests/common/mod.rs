//! Shared fixtures for the daemon scenario tests.
//!
//! These tests spin up the axum router **without** binding a TCP socket:
//! `build_router` over the in-memory ledger, driven via
//! `tower::ServiceExt::oneshot` — no network IO required.
#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use vgn_daemon::{routes, state::AppState};
use vgn_engine::StoreEngine;
use vgn_testkit::MemLedger;

/// Build a fresh in-process router backed by a clean in-memory ledger.
pub fn make_app() -> (MemLedger, axum::Router) {
    let ledger = MemLedger::new();
    let engine = Arc::new(StoreEngine::new(ledger.clone()));
    let router = routes::build_router(AppState::with_stores(ledger.clone(), engine));
    (ledger, router)
}

/// Drive the router with one request; returns (status, parsed JSON body).
/// The body value is `Value::Null` for empty responses.
pub async fn call(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            builder
                .body(axum::body::Body::from(json.to_string()))
                .unwrap()
        }
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = router
        .clone()
        .oneshot(request)
        .await
        .expect("oneshot failed");
    let status = resp.status();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is not valid JSON")
    };

    (status, json)
}

pub async fn get(router: &axum::Router, uri: &str) -> (StatusCode, Value) {
    call(router, "GET", uri, None).await
}

pub async fn post(router: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call(router, "POST", uri, Some(body)).await
}

pub async fn patch(router: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call(router, "PATCH", uri, Some(body)).await
}

pub async fn delete(router: &axum::Router, uri: &str) -> (StatusCode, Value) {
    call(router, "DELETE", uri, None).await
}

/// POST an entity and return its assigned external id.
pub async fn create(router: &axum::Router, uri: &str, body: Value) -> String {
    let (status, json) = post(router, uri, body).await;
    assert_eq!(status, StatusCode::OK, "create failed: {json}");
    json["id"].as_str().expect("created id").to_string()
}
