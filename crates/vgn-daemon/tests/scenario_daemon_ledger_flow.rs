//! End-to-end ledger flow over HTTP: buy, roll, sell against specified
//! lots, settle — the whole chain through the facade.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn buy_roll_sell_settle_flow() {
    let (ledger, app) = make_app();

    let aapl = create(&app, "/v1/insts", json!({"name": "Apple Inc.", "symbol": "AAPL"})).await;
    let usd = create(&app, "/v1/insts", json!({"name": "US Dollar", "symbol": "USD"})).await;

    // --- S1: buy ---------------------------------------------------------
    let buy = create(
        &app,
        "/v1/txns",
        json!({
            "instId": aapl,
            "txnDt": "2024-01-02",
            "settleDt": "2024-01-04",
            "txnType": "trade",
            "txnSubType": "buy",
            "txnSize": 100.0,
            "settleAmtCcyId": usd,
            "settleAmtGross": 10000.0,
            "settleAmtNet": 10000.0,
            "state": "open"
        }),
    )
    .await;

    let (status, body) = post(&app, &format!("/v1/txns/{buy}/process"), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["id"], buy.as_str());
    assert_eq!(body["state"], "processed");

    // Two lots via the filtered list endpoint.
    let filter = json!({"srcTxnId": [buy]}).to_string();
    let uri = format!(
        "/v1/lots?filter={}",
        url_escape(&filter)
    );
    let (status, lots) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let lots = lots.as_array().unwrap().clone();
    assert_eq!(lots.len(), 2);

    let inst_lot = lots
        .iter()
        .find(|l| l["instId"] == aapl.as_str())
        .expect("instrument lot")["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Balance visible through GET /v1/lots/:id?dt=.
    let (status, lot) = get(&app, &format!("/v1/lots/{inst_lot}?dt=2024-01-02")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lot["bal"][0]["lotSize"], 100.0);
    assert_eq!(lot["bal"][0]["unsettledSize"], 100.0);

    // --- roll to the sell date ------------------------------------------
    let (status, body) = post(&app, "/v1/lots/roll", json!({"dt": "2024-01-02"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    // --- S2: sell 40 against the instrument lot -------------------------
    let sell = create(
        &app,
        "/v1/txns",
        json!({
            "instId": aapl,
            "txnDt": "2024-01-03",
            "settleDt": "2024-01-05",
            "txnType": "trade",
            "txnSubType": "sell",
            "txnSize": 40.0,
            "settleAmtCcyId": usd,
            "settleAmtNet": 4000.0,
            "state": "open"
        }),
    )
    .await;

    let (status, body) = post(
        &app,
        &format!("/v1/txns/{sell}/process"),
        json!({"lotIds": [inst_lot]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    // Allocation listed through the filter grammar.
    let filter = json!({"txnType": ["allocation"], "parentId": [sell]}).to_string();
    let (status, allocs) = get(&app, &format!("/v1/txns?filter={}", url_escape(&filter))).await;
    assert_eq!(status, StatusCode::OK);
    let allocs = allocs.as_array().unwrap();
    assert_eq!(allocs.len(), 1);
    assert_eq!(allocs[0]["txnSize"], 40.0);
    assert_eq!(allocs[0]["state"], "processed");
    assert_eq!(allocs[0]["tgtLotId"], inst_lot.as_str());

    let (_, lot) = get(&app, &format!("/v1/lots/{inst_lot}?dt=2024-01-03")).await;
    assert_eq!(lot["bal"][0]["lotSize"], 60.0);
    assert_eq!(lot["bal"][0]["settledSize"], 0.0);
    assert_eq!(lot["bal"][0]["unsettledSize"], 60.0);

    // --- rolls through the settle date ----------------------------------
    for dt in ["2024-01-03", "2024-01-04"] {
        let (status, _) = post(&app, "/v1/lots/roll", json!({"dt": dt})).await;
        assert_eq!(status, StatusCode::OK);
    }

    // --- S3: settle ------------------------------------------------------
    let settle = create(
        &app,
        "/v1/txns",
        json!({
            "parentId": sell,
            "txnDt": "2024-01-05",
            "settleDt": "2024-01-05",
            "txnType": "settle",
            "state": "open"
        }),
    )
    .await;

    let (status, body) = post(&app, &format!("/v1/txns/{settle}/process"), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, lot) = get(&app, &format!("/v1/lots/{inst_lot}?dt=2024-01-05")).await;
    assert_eq!(lot["bal"][0]["settledSize"], -40.0);

    // The sell's receivable is now plain settled cash.
    let filter = json!({"srcTxnId": [sell]}).to_string();
    let (_, pay_recs) = get(&app, &format!("/v1/lots?filter={}", url_escape(&filter))).await;
    let pay_rec = pay_recs.as_array().unwrap()[0]["id"].as_str().unwrap();
    let bal = ledger.balance(pay_rec, "2024-01-05".parse().unwrap()).unwrap();
    assert_eq!(bal.settled_size, bal.lot_size);
    assert_eq!(bal.unsettled_size, 0.0);
}

#[tokio::test]
async fn under_allocated_sell_maps_to_412() {
    let (_ledger, app) = make_app();

    let inst = create(&app, "/v1/insts", json!({"name": "x"})).await;
    let usd = create(&app, "/v1/insts", json!({"name": "usd"})).await;

    // Seed an 80-share lot directly.
    let lot = create(
        &app,
        "/v1/lots",
        json!({"instId": inst, "origDt": "2024-01-02", "origSize": 80.0}),
    )
    .await;

    let sell = create(
        &app,
        "/v1/txns",
        json!({
            "instId": inst,
            "txnDt": "2024-01-02",
            "settleDt": "2024-01-04",
            "txnType": "trade",
            "txnSubType": "sell",
            "txnSize": 100.0,
            "settleAmtCcyId": usd,
            "state": "open"
        }),
    )
    .await;

    let (status, body) = post(
        &app,
        &format!("/v1/txns/{sell}/process"),
        json!({"lotIds": [lot]}),
    )
    .await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["code"], "failed_precondition");
}

// Percent-encode just enough for a JSON filter in a query string.
fn url_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
