//! Facade contract over the reference entities: thin CRUD, URL id wins,
//! create rejects client-supplied ids, masks overlay only named fields.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn version_reports_package_version() {
    let (_ledger, app) = make_app();

    let (status, body) = get(&app, "/v1/version").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn org_crud_round_trip() {
    let (_ledger, app) = make_app();

    let id = create(&app, "/v1/orgs", json!({"name": "holdco"})).await;
    assert!(id.starts_with("org_"), "external form expected, got {id}");

    let (status, org) = get(&app, &format!("/v1/orgs/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(org["name"], "holdco");

    // Child org referencing the parent in external form.
    let child = create(&app, "/v1/orgs", json!({"name": "opco", "parentId": id})).await;
    let (_, fetched) = get(&app, &format!("/v1/orgs/{child}")).await;
    assert_eq!(fetched["parentId"], id.as_str());

    let (status, list) = get(&app, "/v1/orgs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);

    // Masked update touches only the named field.
    let (status, _) = patch(
        &app,
        &format!("/v1/orgs/{child}"),
        json!({"org": {"name": "opco renamed", "parentId": null}, "updateMask": ["name"]}),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, fetched) = get(&app, &format!("/v1/orgs/{child}")).await;
    assert_eq!(fetched["name"], "opco renamed");
    assert_eq!(fetched["parentId"], id.as_str(), "unmasked field kept");

    let (status, _) = delete(&app, &format!("/v1/orgs/{child}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = get(&app, &format!("/v1/orgs/{child}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_with_id_is_invalid_argument() {
    let (_ledger, app) = make_app();

    let (status, body) = post(
        &app,
        "/v1/insts",
        json!({"id": "inst_tjy87Sg2xF7dkXtFtrkU6W", "name": "AAPL"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");
}

#[tokio::test]
async fn update_ignores_body_id() {
    let (_ledger, app) = make_app();

    let id = create(&app, "/v1/accts", json!({"name": "main"})).await;

    // Body carries a different id; the URL id must win.
    let (status, _) = patch(
        &app,
        &format!("/v1/accts/{id}"),
        json!({"acct": {"id": "acct_tjy87Sg2xF7dkXtFtrkU6W", "name": "renamed"}}),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, acct) = get(&app, &format!("/v1/accts/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(acct["name"], "renamed");
    assert_eq!(acct["id"], id.as_str());
}

#[tokio::test]
async fn unknown_mask_path_is_rejected() {
    let (_ledger, app) = make_app();

    let id = create(&app, "/v1/strats", json!({"name": "macro"})).await;

    let (status, body) = patch(
        &app,
        &format!("/v1/strats/{id}"),
        json!({"strat": {"name": "x"}, "updateMask": ["riskBudget"]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");

    // Entity untouched.
    let (_, strat) = get(&app, &format!("/v1/strats/{id}")).await;
    assert_eq!(strat["name"], "macro");
}

#[tokio::test]
async fn missing_entity_is_not_found() {
    let (_ledger, app) = make_app();

    let ghost = vgn_vxid::encode(
        &uuid::Uuid::new_v4().to_string(),
        vgn_vxid::pfx::PORTFOLIO,
    )
    .unwrap();
    let (status, body) = get(&app, &format!("/v1/ports/{ghost}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
    assert!(body["error"].as_str().unwrap().contains(&ghost));
}
