//! Facade validation: roll-date and direction checks, filter JSON checks,
//! the lot balance-seeding create form.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn roll_requires_a_date() {
    let (_ledger, app) = make_app();

    let (status, body) = post(&app, "/v1/lots/roll", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");
    assert!(body["error"].as_str().unwrap().contains("roll date"));

    let (status, _) = post(&app, "/v1/lots/roll", json!({"dt": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(&app, "/v1/lots/roll", json!({"dt": "01/02/2024"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("YYYY-MM-DD"));
}

#[tokio::test]
async fn roll_rejects_unknown_direction() {
    let (_ledger, app) = make_app();

    let (status, body) = post(
        &app,
        "/v1/lots/roll",
        json!({"dt": "2024-01-02", "direction": "sideways"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");

    // Omitted direction defaults to forward; an empty day rolls cleanly.
    let (status, body) = post(&app, "/v1/lots/roll", json!({"dt": "2024-01-02"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    // Back roll over an empty day is also fine.
    let (status, _) = post(
        &app,
        "/v1/lots/roll",
        json!({"dt": "2024-01-02", "direction": "back"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_filter_json_is_rejected() {
    let (_ledger, app) = make_app();

    let (status, body) = get(&app, "/v1/txns?filter=%7Bnot-json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");
    assert!(body["error"].as_str().unwrap().contains("malformed filter"));

    let (status, _) = get(&app, "/v1/lots?filter=%7Bnot-json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No filter at all lists everything.
    let (status, txns) = get(&app, "/v1/txns").await;
    assert_eq!(status, StatusCode::OK);
    assert!(txns.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn lot_create_with_id_needs_balance_rows() {
    let (ledger, app) = make_app();

    let inst = create(&app, "/v1/insts", json!({"name": "x"})).await;

    // Bare id in POST: rejected like every other entity.
    let (status, _) = post(
        &app,
        "/v1/lots",
        json!({"id": "lot_tjy87Sg2xF7dkXtFtrkU6W", "instId": inst, "origDt": "2024-01-02"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The balance-seeding form (id + bal rows) is the documented exception.
    let lot = create(
        &app,
        "/v1/lots",
        json!({"instId": inst, "origDt": "2024-01-02", "origSize": 10.0}),
    )
    .await;

    let (status, _) = post(
        &app,
        "/v1/lots",
        json!({
            "id": lot,
            "origDt": "2024-01-02",
            "bal": [{"lotDt": "2024-01-05", "lotSize": 10.0}]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let bal = ledger.balance(&lot, "2024-01-05".parse().unwrap()).unwrap();
    assert_eq!(bal.lot_size, 10.0);
    assert_eq!(bal.settled_size, 0.0);
    assert_eq!(bal.unsettled_size, 10.0);
}

#[tokio::test]
async fn txn_list_pagination_caps_results() {
    let (_ledger, app) = make_app();

    for i in 0..5 {
        create(
            &app,
            "/v1/txns",
            json!({
                "txnDt": "2024-01-02",
                "settleDt": "2024-01-02",
                "txnType": "xfer",
                "txnSize": i,
                "state": "open"
            }),
        )
        .await;
    }

    let (status, txns) = get(&app, "/v1/txns?maxPageSize=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(txns.as_array().unwrap().len(), 3);
}
