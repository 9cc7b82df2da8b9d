//! Processing an open buy creates the instrument lot and the payable lot,
//! both fully unsettled on the trade date.

mod common;

use common::*;
use vgn_models::TxnState;
use vgn_vxid::pfx;

#[tokio::test]
async fn buy_creates_instrument_lot_and_payable() {
    let (ledger, engine) = setup();
    let aapl = ext_id(pfx::INSTRUMENT);
    let usd = ext_id(pfx::INSTRUMENT);

    let (buy, inst_lot, pay_lot) = run_buy(
        &ledger,
        &engine,
        &aapl,
        &usd,
        "2024-01-02",
        "2024-01-04",
        100.0,
        10_000.0,
    )
    .await;

    // Both lots tie back to the buy and originate on the trade date.
    assert_eq!(inst_lot.src_txn_id.as_deref(), Some(buy.id.as_str()));
    assert_eq!(inst_lot.orig_dt, d("2024-01-02"));
    assert_eq!(inst_lot.orig_size, 100.0);
    assert_eq!(pay_lot.orig_dt, d("2024-01-02"));
    assert_eq!(pay_lot.orig_size, 10_000.0);

    // Opening balances: everything unsettled until the cash leg settles.
    let inst_bal = ledger.balance(&inst_lot.id, d("2024-01-02")).unwrap();
    assert_eq!(inst_bal.lot_size, 100.0);
    assert_eq!(inst_bal.settled_size, 0.0);
    assert_eq!(inst_bal.unsettled_size, 100.0);

    let pay_bal = ledger.balance(&pay_lot.id, d("2024-01-02")).unwrap();
    assert_eq!(pay_bal.lot_size, 10_000.0);
    assert_eq!(pay_bal.settled_size, 0.0);
    assert_eq!(pay_bal.unsettled_size, 10_000.0);

    // Decomposition holds on every engine-written balance.
    assert_eq!(
        inst_bal.lot_size,
        inst_bal.settled_size + inst_bal.unsettled_size
    );

    // The transaction itself is stamped processed.
    let stored = ledger.get_txn(&buy.id).await.unwrap();
    assert_eq!(stored.state, TxnState::Processed);
}

#[tokio::test]
async fn processing_a_processed_buy_is_rejected() {
    let (ledger, engine) = setup();
    let aapl = ext_id(pfx::INSTRUMENT);
    let usd = ext_id(pfx::INSTRUMENT);

    let (buy, ..) = run_buy(
        &ledger,
        &engine,
        &aapl,
        &usd,
        "2024-01-02",
        "2024-01-04",
        100.0,
        10_000.0,
    )
    .await;

    let err = engine.process(&buy.id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::NotOpen { .. }));
    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);

    // No extra lots appeared on the re-run.
    let filter = vgn_models::LotFilter {
        src_txn_id: vec![buy.id.clone()],
        ..Default::default()
    };
    assert_eq!(ledger.list_lots(&filter).await.unwrap().len(), 2);
}
