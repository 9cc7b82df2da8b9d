//! Reinvest: new instrument lot settled immediately, funded by zeroing a
//! cash lot whose balance must match the net settle amount exactly.

mod common;

use common::*;
use vgn_models::{LotFilter, TxnSubType, TxnType};
use vgn_vxid::pfx;

#[tokio::test]
async fn reinvest_settles_new_lot_and_zeroes_funding_lot() {
    let (ledger, engine) = setup();
    let aapl = ext_id(pfx::INSTRUMENT);
    let usd = ext_id(pfx::INSTRUMENT);

    // Dividend cash lot of 50, already settled.
    let cash = seed_lot(&ledger, &usd, "2024-03-01", 50.0).await;
    let mut cash_bal = ledger.balance(&cash.id, d("2024-03-01")).unwrap();
    cash_bal.settled_size = 50.0;
    cash_bal.unsettled_size = 0.0;
    ledger.update_lot_bal(&cash_bal).await.unwrap();

    let mut reinvest = open_txn(
        TxnType::Trade,
        Some(TxnSubType::Reinvest),
        "2024-03-01",
        "2024-03-01",
    );
    reinvest.inst_id = Some(aapl.clone());
    reinvest.src_lot_id = Some(cash.id.clone());
    reinvest.txn_size = 2.0;
    reinvest.settle_amt_net = 50.0;
    let reinvest = ledger.create_txn(&reinvest).await.unwrap();

    engine.process(&reinvest.id, None).await.expect("reinvest");

    // New instrument lot, fully settled on arrival.
    let new_lots = ledger
        .list_lots(&LotFilter {
            src_txn_id: vec![reinvest.id.clone()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(new_lots.len(), 1, "reinvest creates no payable/receivable");
    let new_bal = ledger.balance(&new_lots[0].id, d("2024-03-01")).unwrap();
    assert_eq!(new_bal.lot_size, 2.0);
    assert_eq!(new_bal.settled_size, 2.0);
    assert_eq!(new_bal.unsettled_size, 0.0);

    // Funding lot zeroed in all three components.
    let funded = ledger.balance(&cash.id, d("2024-03-01")).unwrap();
    assert_eq!(funded.lot_size, 0.0);
    assert_eq!(funded.settled_size, 0.0);
    assert_eq!(funded.unsettled_size, 0.0);
}

#[tokio::test]
async fn reinvest_refuses_funding_size_mismatch() {
    let (ledger, engine) = setup();
    let aapl = ext_id(pfx::INSTRUMENT);
    let usd = ext_id(pfx::INSTRUMENT);

    let cash = seed_lot(&ledger, &usd, "2024-03-01", 49.0).await;

    let mut reinvest = open_txn(
        TxnType::Trade,
        Some(TxnSubType::Reinvest),
        "2024-03-01",
        "2024-03-01",
    );
    reinvest.inst_id = Some(aapl);
    reinvest.src_lot_id = Some(cash.id.clone());
    reinvest.txn_size = 2.0;
    reinvest.settle_amt_net = 50.0;
    let reinvest = ledger.create_txn(&reinvest).await.unwrap();

    let err = engine.process(&reinvest.id, None).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::ReinvestFundingMismatch { expected, found, .. }
            if expected == 50.0 && found == 49.0
    ));
    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);

    // Funding lot untouched on refusal.
    let bal = ledger.balance(&cash.id, d("2024-03-01")).unwrap();
    assert_eq!(bal.lot_size, 49.0);
}
