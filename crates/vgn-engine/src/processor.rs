//! The transaction processor.
//!
//! `Process(txn_id, lot_ids?)` loads the transaction, verifies it is `open`,
//! dispatches on `(txn_type, txn_sub_type)`, performs the side effects for
//! that arm, then stamps `state = processed`. Writes happen in the order
//! documented on each arm; atomicity is the caller's choice of store
//! (see [`crate::PgEngine`] for the transactional wrapper).
//!
//! # Invariants enforced here
//!
//! - size conservation: Σ allocation sizes == parent size at settlement;
//! - balance decomposition: origination, sell, sweep, income and
//!   payable/receivable writes keep
//!   `lot_size == settled_size + unsettled_size` (allocation settlement
//!   moves `settled_size` alone, by definition);
//! - payable/receivable uniqueness per settling parent (in the settlement
//!   currency);
//! - sweep sources must carry no unsettled size;
//! - reinvest funding lots must match the net settle amount exactly.
//!
//! The engine never chooses lots: a sell consumes the caller-supplied
//! candidate list in caller order, which is how selection policy (FIFO,
//! HIFO, ...) stays outside this crate.

use std::collections::BTreeMap;

use tracing::info;

use vgn_models::{Lot, LotBal, LotFilter, Txn, TxnFilter, TxnState, TxnSubType, TxnType};
use vgn_store::{LotStore, StoreError, TxnStore};

use crate::error::EngineError;

/// Result of a `Process` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub id: String,
    pub state: TxnState,
}

/// One `Process` invocation's view of the stores. Borrowed, so the same
/// processor logic runs over a pool, a unit-of-work, or the in-memory
/// testkit backend.
pub struct Processor<'a> {
    txns: &'a dyn TxnStore,
    lots: &'a dyn LotStore,
}

impl<'a> Processor<'a> {
    pub fn new(txns: &'a dyn TxnStore, lots: &'a dyn LotStore) -> Self {
        Self { txns, lots }
    }

    /// Process one open transaction.
    pub async fn process(
        &self,
        id: &str,
        lot_ids: Option<&[String]>,
    ) -> Result<ProcessOutcome, EngineError> {
        let mut txn = self.txns.get_txn(id).await?;

        // Only open transactions are processed; state never moves backward.
        if txn.state != TxnState::Open {
            return Err(EngineError::NotOpen {
                id: txn.id,
                state: txn.state,
            });
        }

        info!(txn = %txn.id, txn_type = %txn.txn_type, "processing transaction");

        match (txn.txn_type, txn.txn_sub_type) {
            (TxnType::Trade, Some(sub)) if trade_sub(sub) => {
                match sub {
                    TxnSubType::Buy => self.trade_buy(&txn).await?,
                    TxnSubType::Sell => self.trade_sell(&txn, lot_ids).await?,
                    TxnSubType::Reinvest => self.trade_reinvest(&txn).await?,
                    _ => unreachable!(),
                }
                // Non-reinvest trades owe/expect cash until settlement.
                if sub != TxnSubType::Reinvest {
                    self.create_pay_rec(&txn).await?;
                }
            }
            (TxnType::Income, Some(sub @ (TxnSubType::Dividend | TxnSubType::Interest))) => {
                self.income(&txn, sub).await?;
            }
            (TxnType::Sweep, Some(sub @ (TxnSubType::In | TxnSubType::Out))) => {
                self.sweep(&txn, sub).await?;
            }
            (TxnType::Settle, _) => self.settle(&txn).await?,
            // Transfers are taxonomy-only for now; allocations are normally
            // born processed. Either way processing is a pure state change.
            (TxnType::Transfer, _) | (TxnType::Allocation, _) => {}
            (txn_type, sub) => {
                return Err(EngineError::Unsupported {
                    id: txn.id,
                    txn_type,
                    sub_type: sub.map(|s| s.as_str().to_string()).unwrap_or_default(),
                });
            }
        }

        // All side effects landed: stamp the state. A failure here is
        // surfaced to the caller with the side effects already issued.
        txn.state = TxnState::Processed;
        self.txns.update_txn(&txn, None).await?;

        Ok(ProcessOutcome {
            id: txn.id,
            state: TxnState::Processed,
        })
    }

    // -----------------------------------------------------------------------
    // trade/buy
    // -----------------------------------------------------------------------

    /// Buy: one new lot in the traded instrument, sized by the trade,
    /// originated on the trade date, fully unsettled.
    async fn trade_buy(&self, txn: &Txn) -> Result<(), EngineError> {
        let inst_id = require(txn, txn.inst_id.as_deref(), "instrument id")?;

        self.lots
            .create_lot(&new_lot(inst_id, &txn.id, txn.txn_dt, txn.txn_size))
            .await?;

        Ok(())
    }

    // -----------------------------------------------------------------------
    // trade/sell
    // -----------------------------------------------------------------------

    /// Sell: consume the caller-ordered candidate lots until the sell size
    /// is exhausted, emitting one allocation transaction per lot touched.
    ///
    /// Balances are fetched in ascending lot-id order first so concurrent
    /// sells over overlapping lot lists acquire row locks in a single
    /// global order, then consumed in caller order. Settled size is not
    /// touched here; it moves at settlement.
    async fn trade_sell(&self, txn: &Txn, lot_ids: Option<&[String]>) -> Result<(), EngineError> {
        let candidates = match lot_ids {
            Some(ids) if !ids.is_empty() => ids,
            _ => {
                return Err(EngineError::MissingField {
                    id: txn.id.clone(),
                    field: "lot ids",
                })
            }
        };

        let mut remaining = txn.txn_size;
        if remaining == 0.0 {
            return Ok(());
        }

        // Lock pass, ascending lot id. A candidate with no balance row is
        // skipped here, not failed: the walk below may stop before reaching
        // it, and only a lot actually walked gets to raise NotFound.
        let mut fetched: BTreeMap<&str, LotBal> = BTreeMap::new();
        let mut ordered: Vec<&str> = candidates.iter().map(String::as_str).collect();
        ordered.sort_unstable();
        ordered.dedup();
        for lot_id in ordered {
            match self.lots.get_lot_bal(lot_id, txn.txn_dt).await {
                Ok(bal) => {
                    fetched.insert(lot_id, bal);
                }
                Err(StoreError::NotFound { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        // Allocation pass, caller order.
        for lot_id in candidates {
            let mut bal = match fetched.remove(lot_id.as_str()) {
                Some(bal) => bal,
                // Missing from the cache: either the same lot listed twice
                // (re-read so the first pass's write is visible) or a row
                // that was absent in the lock pass (NotFound surfaces now).
                None => self.lots.get_lot_bal(lot_id, txn.txn_dt).await?,
            };

            let alloc;
            if remaining <= bal.lot_size {
                alloc = remaining;
                bal.lot_size -= alloc;
                bal.unsettled_size -= alloc;
                remaining = 0.0;
            } else {
                alloc = bal.lot_size;
                remaining -= alloc;
                bal.lot_size = 0.0;
                bal.unsettled_size = 0.0;
            }
            self.lots.update_lot_bal(&bal).await?;

            let alloc_txn = allocation_txn(txn, lot_id, alloc);
            self.txns.create_txn(&alloc_txn).await?;
            info!(sell = %txn.id, lot = %lot_id, size = alloc, "allocated");

            if remaining == 0.0 {
                break;
            }
        }

        if remaining > 0.0 {
            return Err(EngineError::UnderAllocated {
                id: txn.id.clone(),
                requested: txn.txn_size,
                remaining,
            });
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // trade/reinvest
    // -----------------------------------------------------------------------

    /// Reinvest: new instrument lot settled on creation, funded by zeroing
    /// the source cash lot, whose balance must equal the net settle amount.
    async fn trade_reinvest(&self, txn: &Txn) -> Result<(), EngineError> {
        let inst_id = require(txn, txn.inst_id.as_deref(), "instrument id")?;
        let src_lot_id = require(txn, txn.src_lot_id.as_deref(), "source lot id")?;

        let lot = self
            .lots
            .create_lot(&new_lot(inst_id, &txn.id, txn.txn_dt, txn.txn_size))
            .await?;

        // Shares from a reinvest never await a cash leg: settle on arrival.
        let mut bal = self.lots.get_lot_bal(&lot.id, txn.settle_dt).await?;
        bal.settled_size = bal.lot_size;
        bal.unsettled_size = 0.0;
        self.lots.update_lot_bal(&bal).await?;

        let mut funding = self.lots.get_lot_bal(src_lot_id, txn.settle_dt).await?;
        if funding.lot_size != txn.settle_amt_net {
            return Err(EngineError::ReinvestFundingMismatch {
                id: txn.id.clone(),
                lot_id: funding.lot_id,
                expected: txn.settle_amt_net,
                found: funding.lot_size,
            });
        }

        funding.lot_size = 0.0;
        funding.settled_size = 0.0;
        funding.unsettled_size = 0.0;
        self.lots.update_lot_bal(&funding).await?;

        Ok(())
    }

    // -----------------------------------------------------------------------
    // payable/receivable
    // -----------------------------------------------------------------------

    /// One lot in the settlement currency representing the cash obligation
    /// of a non-reinvest trade until it settles.
    async fn create_pay_rec(&self, txn: &Txn) -> Result<(), EngineError> {
        let ccy_id = require(txn, txn.settle_amt_ccy_id.as_deref(), "settle currency id")?;

        self.lots
            .create_lot(&new_lot(ccy_id, &txn.id, txn.txn_dt, txn.settle_amt_net))
            .await?;

        Ok(())
    }

    // -----------------------------------------------------------------------
    // income/dividend, income/interest
    // -----------------------------------------------------------------------

    /// Income: cash lot in the settlement currency, originated and settled
    /// on the settle date. Interest is handled exactly like dividend.
    async fn income(&self, txn: &Txn, sub: TxnSubType) -> Result<(), EngineError> {
        let ccy_id = require(txn, txn.settle_amt_ccy_id.as_deref(), "settle currency id")?;

        let lot = self
            .lots
            .create_lot(&new_lot(ccy_id, &txn.id, txn.settle_dt, txn.txn_size))
            .await?;

        let mut bal = self.lots.get_lot_bal(&lot.id, lot.orig_dt).await?;
        bal.settled_size = bal.lot_size;
        bal.unsettled_size = 0.0;
        self.lots.update_lot_bal(&bal).await?;

        info!(txn = %txn.id, sub_type = %sub, lot = %lot.id, "income lot settled");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // sweep/in, sweep/out
    // -----------------------------------------------------------------------

    /// Sweep settled cash from the source lot into the target lot on the
    /// settle date. Refuses to move unsettled cash.
    async fn sweep(&self, txn: &Txn, sub: TxnSubType) -> Result<(), EngineError> {
        let src_lot_id = require(txn, txn.src_lot_id.as_deref(), "source lot id")?;
        let tgt_lot_id = require(txn, txn.tgt_lot_id.as_deref(), "target lot id")?;

        let (sweep_id, cash_id) = match sub {
            TxnSubType::In => (tgt_lot_id, src_lot_id),
            _ => (src_lot_id, tgt_lot_id),
        };

        // Fetch both balances in ascending lot-id order so concurrent sweeps
        // cannot deadlock, then check the precondition.
        let (mut cash_bal, mut sweep_bal) = if cash_id <= sweep_id {
            let cash = self.lots.get_lot_bal(cash_id, txn.settle_dt).await?;
            let sweep = self.lots.get_lot_bal(sweep_id, txn.settle_dt).await?;
            (cash, sweep)
        } else {
            let sweep = self.lots.get_lot_bal(sweep_id, txn.settle_dt).await?;
            let cash = self.lots.get_lot_bal(cash_id, txn.settle_dt).await?;
            (cash, sweep)
        };

        if cash_bal.unsettled_size != 0.0 {
            return Err(EngineError::UnsettledSweep {
                id: txn.id.clone(),
                lot_id: cash_bal.lot_id,
            });
        }

        sweep_bal.lot_size += cash_bal.lot_size;
        sweep_bal.settled_size = sweep_bal.lot_size;
        sweep_bal.unsettled_size = 0.0;
        self.lots.update_lot_bal(&sweep_bal).await?;

        cash_bal.lot_size = 0.0;
        cash_bal.settled_size = 0.0;
        cash_bal.unsettled_size = 0.0;
        self.lots.update_lot_bal(&cash_bal).await?;

        Ok(())
    }

    // -----------------------------------------------------------------------
    // settle
    // -----------------------------------------------------------------------

    /// Settle the parent trade: verify size conservation over its
    /// allocations, move settled size on every allocated lot, then flip the
    /// parent's payable/receivable into a plain currency holding.
    async fn settle(&self, txn: &Txn) -> Result<(), EngineError> {
        let parent_id = require(txn, txn.parent_id.as_deref(), "parent transaction id")?;
        let parent = self.txns.get_txn(parent_id).await?;

        let filter = TxnFilter {
            txn_type: vec![TxnType::Allocation.as_str().to_string()],
            parent_id: vec![parent.id.clone()],
            ..TxnFilter::default()
        };
        let mut allocs = self.txns.list_txns(&filter).await?;

        let found: f64 = allocs.iter().map(|a| a.txn_size).sum();
        if found != parent.txn_size {
            return Err(EngineError::SizeConservation {
                id: txn.id.clone(),
                expected: parent.txn_size,
                found,
            });
        }

        // Settled size decreases for sells, increases for buys/reinvests.
        let multiplier = if parent.txn_sub_type == Some(TxnSubType::Sell) {
            -1.0
        } else {
            1.0
        };

        // Ascending target-lot order, for the same lock-order reason as the
        // sell path.
        allocs.sort_by(|a, b| a.tgt_lot_id.cmp(&b.tgt_lot_id));
        for alloc in &allocs {
            let tgt_lot_id = require(alloc, alloc.tgt_lot_id.as_deref(), "target lot id")?;

            let mut bal = self.lots.get_lot_bal(tgt_lot_id, txn.settle_dt).await?;
            bal.settled_size += alloc.txn_size * multiplier;
            self.lots.update_lot_bal(&bal).await?;
        }

        // Exactly one payable/receivable in the settlement currency.
        let lot_filter = LotFilter {
            src_txn_id: vec![parent.id.clone()],
            ..LotFilter::default()
        };
        let mut pay_recs = self.lots.list_lots(&lot_filter).await?;
        if parent.settle_amt_ccy_id.is_some() {
            pay_recs.retain(|l| l.inst_id == parent.settle_amt_ccy_id);
        }

        if pay_recs.is_empty() {
            return Err(EngineError::PayRecMissing {
                id: txn.id.clone(),
                parent_id: parent.id.clone(),
            });
        }
        if pay_recs.len() > 1 {
            return Err(EngineError::PayRecAmbiguous {
                id: txn.id.clone(),
                parent_id: parent.id.clone(),
                count: pay_recs.len(),
            });
        }

        // Settling the payable/receivable implicitly turns it into a normal
        // currency holding.
        let mut bal = self
            .lots
            .get_lot_bal(&pay_recs[0].id, txn.settle_dt)
            .await?;
        bal.settled_size = bal.lot_size;
        bal.unsettled_size = 0.0;
        self.lots.update_lot_bal(&bal).await?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn trade_sub(sub: TxnSubType) -> bool {
    matches!(
        sub,
        TxnSubType::Buy | TxnSubType::Sell | TxnSubType::Reinvest
    )
}

fn require<'t>(txn: &Txn, field: Option<&'t str>, name: &'static str) -> Result<&'t str, EngineError> {
    match field {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(EngineError::MissingField {
            id: txn.id.clone(),
            field: name,
        }),
    }
}

/// A fresh engine-originated lot tied back to its source transaction.
fn new_lot(inst_id: &str, src_txn_id: &str, orig_dt: chrono::NaiveDate, orig_size: f64) -> Lot {
    Lot {
        id: String::new(),
        inst_id: Some(inst_id.to_string()),
        src_txn_id: Some(src_txn_id.to_string()),
        le_org_id: None,
        acct_id: None,
        orig_dt,
        orig_size,
        bal: Vec::new(),
    }
}

/// Synthetic child transaction recording that `lot_id` absorbed `size` of
/// the parent sell. Born processed.
fn allocation_txn(parent: &Txn, lot_id: &str, size: f64) -> Txn {
    Txn {
        id: String::new(),
        parent_id: Some(parent.id.clone()),
        inst_id: None,
        src_lot_id: None,
        tgt_lot_id: Some(lot_id.to_string()),
        txn_dt: parent.txn_dt,
        settle_dt: parent.txn_dt,
        txn_type: TxnType::Allocation,
        txn_sub_type: None,
        txn_size: size,
        trade_amt_ccy_id: None,
        trade_amt_gross: 0.0,
        trade_amt_net: 0.0,
        settle_amt_ccy_id: None,
        settle_amt_gross: 0.0,
        settle_amt_net: 0.0,
        state: TxnState::Processed,
    }
}
