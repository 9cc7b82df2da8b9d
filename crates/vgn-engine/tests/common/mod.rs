//! Shared fixtures for the engine scenario tests.
#![allow(dead_code)]

use chrono::NaiveDate;
use uuid::Uuid;

use vgn_models::{Lot, Txn, TxnState, TxnSubType, TxnType};
use vgn_testkit::MemLedger;

pub use vgn_engine::{Engine, EngineError, StoreEngine};
pub use vgn_store::{ErrorKind, LotStore, TxnStore};

pub fn d(s: &str) -> NaiveDate {
    s.parse().expect("test date")
}

/// Fresh ledger plus a plain (non-transactional) engine over it.
pub fn setup() -> (MemLedger, StoreEngine<MemLedger>) {
    let ledger = MemLedger::new();
    let engine = StoreEngine::new(ledger.clone());
    (ledger, engine)
}

/// A fresh external id with the given prefix, for seeding references.
pub fn ext_id(prefix: &str) -> String {
    vgn_vxid::encode(&Uuid::new_v4().to_string(), prefix).unwrap()
}

/// Minimal open transaction; tests fill in what their arm needs.
pub fn open_txn(txn_type: TxnType, sub: Option<TxnSubType>, txn_dt: &str, settle_dt: &str) -> Txn {
    Txn {
        id: String::new(),
        parent_id: None,
        inst_id: None,
        src_lot_id: None,
        tgt_lot_id: None,
        txn_dt: d(txn_dt),
        settle_dt: d(settle_dt),
        txn_type,
        txn_sub_type: sub,
        txn_size: 0.0,
        trade_amt_ccy_id: None,
        trade_amt_gross: 0.0,
        trade_amt_net: 0.0,
        settle_amt_ccy_id: None,
        settle_amt_gross: 0.0,
        settle_amt_net: 0.0,
        state: TxnState::Open,
    }
}

/// Seed a bare lot (with its opening balance) directly through the store.
pub async fn seed_lot(ledger: &MemLedger, inst_id: &str, orig_dt: &str, size: f64) -> Lot {
    ledger
        .create_lot(&Lot {
            id: String::new(),
            inst_id: Some(inst_id.to_string()),
            src_txn_id: None,
            le_org_id: None,
            acct_id: None,
            orig_dt: d(orig_dt),
            orig_size: size,
            bal: Vec::new(),
        })
        .await
        .expect("seed lot")
}

/// Post an open buy and process it; returns (buy txn, instrument lot,
/// payable lot).
pub async fn run_buy(
    ledger: &MemLedger,
    engine: &StoreEngine<MemLedger>,
    inst: &str,
    ccy: &str,
    txn_dt: &str,
    settle_dt: &str,
    size: f64,
    settle_net: f64,
) -> (Txn, Lot, Lot) {
    let mut buy = open_txn(TxnType::Trade, Some(TxnSubType::Buy), txn_dt, settle_dt);
    buy.inst_id = Some(inst.to_string());
    buy.txn_size = size;
    buy.settle_amt_ccy_id = Some(ccy.to_string());
    buy.settle_amt_net = settle_net;

    let buy = ledger.create_txn(&buy).await.unwrap();
    engine.process(&buy.id, None).await.expect("process buy");

    let filter = vgn_models::LotFilter {
        src_txn_id: vec![buy.id.clone()],
        ..Default::default()
    };
    let lots = ledger.list_lots(&filter).await.unwrap();
    assert_eq!(lots.len(), 2, "buy creates instrument lot + payable");

    let inst_lot = lots
        .iter()
        .find(|l| l.inst_id.as_deref() == Some(inst))
        .cloned()
        .expect("instrument lot");
    let pay_lot = lots
        .iter()
        .find(|l| l.inst_id.as_deref() == Some(ccy))
        .cloned()
        .expect("payable lot");

    (buy, inst_lot, pay_lot)
}
