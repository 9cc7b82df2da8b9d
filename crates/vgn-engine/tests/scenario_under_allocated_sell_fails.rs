//! A sell whose candidate lots cannot cover the full size fails with
//! FailedPrecondition after exhausting the list.

mod common;

use common::*;
use vgn_models::{TxnFilter, TxnState, TxnSubType, TxnType};
use vgn_vxid::pfx;

#[tokio::test]
async fn sell_of_100_against_80_fails_under_allocated() {
    let (ledger, engine) = setup();
    let inst = ext_id(pfx::INSTRUMENT);
    let usd = ext_id(pfx::INSTRUMENT);

    let lot_a = seed_lot(&ledger, &inst, "2024-04-01", 30.0).await;
    let lot_b = seed_lot(&ledger, &inst, "2024-04-01", 50.0).await;

    let mut sell = open_txn(
        TxnType::Trade,
        Some(TxnSubType::Sell),
        "2024-04-01",
        "2024-04-03",
    );
    sell.txn_size = 100.0;
    sell.settle_amt_ccy_id = Some(usd);
    sell.settle_amt_net = 10_000.0;
    let sell = ledger.create_txn(&sell).await.unwrap();

    let err = engine
        .process(&sell.id, Some(&[lot_a.id.clone(), lot_b.id.clone()]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::UnderAllocated { requested, remaining, .. }
            if requested == 100.0 && remaining == 20.0
    ));
    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);

    // The transaction was not stamped processed.
    assert_eq!(
        ledger.get_txn(&sell.id).await.unwrap().state,
        TxnState::Open
    );

    // This backend is non-transactional: the partial allocations stay
    // visible. The transactional Postgres engine rolls them back instead.
    let allocs = ledger
        .list_txns(&TxnFilter {
            txn_type: vec![TxnType::Allocation.as_str().to_string()],
            parent_id: vec![sell.id.clone()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(allocs.len(), 2);
    let allocated: f64 = allocs.iter().map(|a| a.txn_size).sum();
    assert_eq!(allocated, 80.0);
}

#[tokio::test]
async fn zero_size_sell_emits_no_allocations() {
    let (ledger, engine) = setup();
    let inst = ext_id(pfx::INSTRUMENT);
    let usd = ext_id(pfx::INSTRUMENT);

    let lot = seed_lot(&ledger, &inst, "2024-04-01", 30.0).await;

    let mut sell = open_txn(
        TxnType::Trade,
        Some(TxnSubType::Sell),
        "2024-04-01",
        "2024-04-03",
    );
    sell.txn_size = 0.0;
    sell.settle_amt_ccy_id = Some(usd);
    let sell = ledger.create_txn(&sell).await.unwrap();

    engine
        .process(&sell.id, Some(&[lot.id.clone()]))
        .await
        .unwrap();

    let allocs = ledger
        .list_txns(&TxnFilter {
            txn_type: vec![TxnType::Allocation.as_str().to_string()],
            parent_id: vec![sell.id.clone()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(allocs.is_empty());

    let bal = ledger.balance(&lot.id, d("2024-04-01")).unwrap();
    assert_eq!(bal.lot_size, 30.0, "candidate lot untouched");
}
