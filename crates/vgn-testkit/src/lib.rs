//! Deterministic in-memory ledger backend.
//!
//! [`MemLedger`] implements every store trait over plain maps so the engine
//! and the daemon can be scenario-tested without Postgres. Semantics mirror
//! the Postgres stores where tests can observe them: ids are generated on
//! create and returned in external form, creating a lot seeds its opening
//! balance, deleting a lot cascades to its balances, inserting a duplicate
//! `(lot_id, lot_dt)` balance fails the way a primary-key violation would,
//! and malformed external ids are rejected before lookup.
//!
//! No IO and no time; the only nondeterminism is the v4 ids themselves.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use vgn_models::mask::{
    overlay_acct, overlay_inst, overlay_lot, overlay_org, overlay_port, overlay_strat,
    overlay_txn,
};
use vgn_models::{Acct, Inst, Lot, LotBal, LotFilter, Org, Port, Strat, Txn, TxnFilter};
use vgn_store::{
    AcctStore, InstStore, LotStore, OrgStore, PortStore, StoreError, StratStore, TxnStore,
};
use vgn_vxid::pfx;

#[derive(Default)]
struct Inner {
    orgs: BTreeMap<String, Org>,
    accts: BTreeMap<String, Acct>,
    ports: BTreeMap<String, Port>,
    strats: BTreeMap<String, Strat>,
    insts: BTreeMap<String, Inst>,
    txns: BTreeMap<String, Txn>,
    lots: BTreeMap<String, Lot>,
    bals: BTreeMap<(String, NaiveDate), LotBal>,
}

/// Shared in-memory backend; clones share state.
#[derive(Clone, Default)]
pub struct MemLedger {
    inner: Arc<Mutex<Inner>>,
}

impl MemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("mem ledger poisoned")
    }

    /// Direct balance peek for test assertions.
    pub fn balance(&self, lot_id: &str, dt: NaiveDate) -> Option<LotBal> {
        self.lock().bals.get(&(lot_id.to_string(), dt)).cloned()
    }

    /// All transactions, in id order, for test assertions.
    pub fn txns(&self) -> Vec<Txn> {
        self.lock().txns.values().cloned().collect()
    }
}

fn new_id(prefix: &str) -> String {
    vgn_vxid::encode(&Uuid::new_v4().to_string(), prefix).expect("fresh uuid encodes")
}

// Validate an external id the way the Postgres stores do on decode.
fn check_id(id: &str, what: &'static str) -> Result<(), StoreError> {
    if id.is_empty() {
        return Err(StoreError::InvalidArgument(format!("missing {what}")));
    }
    vgn_vxid::decode(id)?;
    Ok(())
}

fn not_found(entity: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        entity,
        id: id.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Reference entities
// ---------------------------------------------------------------------------

macro_rules! mem_ref_store {
    ($trait:ident, $ty:ty, $map:ident, $entity:literal, $pfx:expr, $overlay:path,
     $get:ident, $list:ident, $update:ident, $create:ident, $delete:ident) => {
        #[async_trait]
        impl $trait for MemLedger {
            async fn $get(&self, id: &str) -> Result<$ty, StoreError> {
                check_id(id, $entity)?;
                self.lock()
                    .$map
                    .get(id)
                    .cloned()
                    .ok_or_else(|| not_found($entity, id))
            }

            async fn $list(&self) -> Result<Vec<$ty>, StoreError> {
                Ok(self.lock().$map.values().cloned().collect())
            }

            async fn $update(
                &self,
                entity: &$ty,
                mask: Option<&[String]>,
            ) -> Result<(), StoreError> {
                check_id(&entity.id, $entity)?;
                let mut inner = self.lock();
                let current = inner
                    .$map
                    .get_mut(&entity.id)
                    .ok_or_else(|| not_found($entity, &entity.id))?;
                match mask {
                    // Overlay a copy first so a bad path leaves the stored
                    // row untouched, as the read-merge-write stores do.
                    Some(paths) => {
                        let mut merged = current.clone();
                        $overlay(&mut merged, entity, paths)?;
                        *current = merged;
                    }
                    None => *current = entity.clone(),
                }
                Ok(())
            }

            async fn $create(&self, entity: &$ty) -> Result<$ty, StoreError> {
                let mut created = entity.clone();
                created.id = new_id($pfx);
                self.lock().$map.insert(created.id.clone(), created.clone());
                Ok(created)
            }

            async fn $delete(&self, id: &str) -> Result<(), StoreError> {
                check_id(id, $entity)?;
                self.lock().$map.remove(id);
                Ok(())
            }
        }
    };
}

mem_ref_store!(OrgStore, Org, orgs, "org", pfx::ORGANIZATION, overlay_org,
    get_org, list_orgs, update_org, create_org, delete_org);
mem_ref_store!(AcctStore, Acct, accts, "account", pfx::ACCOUNT, overlay_acct,
    get_acct, list_accts, update_acct, create_acct, delete_acct);
mem_ref_store!(PortStore, Port, ports, "portfolio", pfx::PORTFOLIO, overlay_port,
    get_port, list_ports, update_port, create_port, delete_port);
mem_ref_store!(StratStore, Strat, strats, "strategy", pfx::STRATEGY, overlay_strat,
    get_strat, list_strats, update_strat, create_strat, delete_strat);
mem_ref_store!(InstStore, Inst, insts, "instrument", pfx::INSTRUMENT, overlay_inst,
    get_inst, list_insts, update_inst, create_inst, delete_inst);

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

fn txn_matches(txn: &Txn, filter: &TxnFilter) -> bool {
    if !filter.id.is_empty() && !filter.id.contains(&txn.id) {
        return false;
    }
    let ty = txn.txn_type.as_str().to_string();
    if !filter.txn_type.is_empty() && !filter.txn_type.contains(&ty) {
        return false;
    }
    if !filter.txn_type_neq.is_empty() && filter.txn_type_neq.contains(&ty) {
        return false;
    }
    if !filter.parent_id.is_empty() {
        match &txn.parent_id {
            Some(p) if filter.parent_id.contains(p) => {}
            _ => return false,
        }
    }
    true
}

#[async_trait]
impl TxnStore for MemLedger {
    async fn get_txn(&self, id: &str) -> Result<Txn, StoreError> {
        check_id(id, "transaction")?;
        self.lock()
            .txns
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("transaction", id))
    }

    async fn list_txns(&self, filter: &TxnFilter) -> Result<Vec<Txn>, StoreError> {
        let mut txns: Vec<Txn> = self
            .lock()
            .txns
            .values()
            .filter(|t| txn_matches(t, filter))
            .cloned()
            .collect();
        if filter.page_size > 0 {
            txns.truncate(filter.page_size as usize);
        }
        Ok(txns)
    }

    async fn update_txn(&self, txn: &Txn, mask: Option<&[String]>) -> Result<(), StoreError> {
        check_id(&txn.id, "transaction")?;
        let mut inner = self.lock();
        let current = inner
            .txns
            .get_mut(&txn.id)
            .ok_or_else(|| not_found("transaction", &txn.id))?;
        match mask {
            Some(paths) => {
                let mut merged = current.clone();
                overlay_txn(&mut merged, txn, paths)?;
                *current = merged;
            }
            None => *current = txn.clone(),
        }
        Ok(())
    }

    async fn create_txn(&self, txn: &Txn) -> Result<Txn, StoreError> {
        let mut created = txn.clone();
        created.id = new_id(pfx::TRANSACTION);
        self.lock().txns.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn delete_txn(&self, id: &str) -> Result<(), StoreError> {
        check_id(id, "transaction")?;
        self.lock().txns.remove(id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Lots and balances
// ---------------------------------------------------------------------------

fn lot_matches(lot: &Lot, filter: &LotFilter) -> bool {
    if !filter.id.is_empty() && !filter.id.contains(&lot.id) {
        return false;
    }
    if !filter.src_txn_id.is_empty() {
        match &lot.src_txn_id {
            Some(s) if filter.src_txn_id.contains(s) => {}
            _ => return false,
        }
    }
    true
}

#[async_trait]
impl LotStore for MemLedger {
    async fn get_lot(&self, id: &str, dt: Option<NaiveDate>) -> Result<Lot, StoreError> {
        check_id(id, "lot")?;
        let inner = self.lock();
        let mut lot = inner
            .lots
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("lot", id))?;

        if let Some(dt) = dt {
            let bal = inner
                .bals
                .get(&(id.to_string(), dt))
                .cloned()
                .ok_or_else(|| StoreError::NotFound {
                    entity: "lot balance",
                    id: format!("{id} on {dt}"),
                })?;
            lot.bal.push(bal);
        }

        Ok(lot)
    }

    async fn list_lots(&self, filter: &LotFilter) -> Result<Vec<Lot>, StoreError> {
        let mut lots: Vec<Lot> = self
            .lock()
            .lots
            .values()
            .filter(|l| lot_matches(l, filter))
            .cloned()
            .collect();
        if filter.page_size > 0 {
            lots.truncate(filter.page_size as usize);
        }
        Ok(lots)
    }

    async fn update_lot(&self, lot: &Lot, mask: Option<&[String]>) -> Result<(), StoreError> {
        check_id(&lot.id, "lot")?;

        if !lot.bal.is_empty() {
            for bal in &lot.bal {
                let mut bal = bal.clone();
                bal.lot_id = lot.id.clone();
                self.update_lot_bal(&bal).await?;
            }
            return Ok(());
        }

        let mut inner = self.lock();
        let current = inner
            .lots
            .get_mut(&lot.id)
            .ok_or_else(|| not_found("lot", &lot.id))?;
        match mask {
            Some(paths) => {
                let mut merged = current.clone();
                overlay_lot(&mut merged, lot, paths)?;
                *current = merged;
            }
            None => {
                let mut replacement = lot.clone();
                replacement.bal = Vec::new();
                *current = replacement;
            }
        }
        Ok(())
    }

    async fn create_lot(&self, lot: &Lot) -> Result<Lot, StoreError> {
        // Balance-seeding form: balances for an existing lot.
        if !lot.bal.is_empty() {
            check_id(&lot.id, "lot")?;
            for bal in &lot.bal {
                let seeded = LotBal {
                    lot_id: lot.id.clone(),
                    lot_dt: bal.lot_dt,
                    lot_size: bal.lot_size,
                    settled_size: 0.0,
                    unsettled_size: bal.lot_size,
                };
                self.create_lot_bal(&seeded).await?;
            }
            return Ok(lot.clone());
        }

        let mut created = lot.clone();
        created.id = new_id(pfx::LOT);

        let opening = LotBal {
            lot_id: created.id.clone(),
            lot_dt: created.orig_dt,
            lot_size: created.orig_size,
            settled_size: 0.0,
            unsettled_size: created.orig_size,
        };

        let mut inner = self.lock();
        inner.lots.insert(created.id.clone(), created.clone());
        inner
            .bals
            .insert((created.id.clone(), opening.lot_dt), opening);

        Ok(created)
    }

    async fn delete_lot(&self, id: &str) -> Result<(), StoreError> {
        check_id(id, "lot")?;
        let mut inner = self.lock();
        inner.bals.retain(|(lot_id, _), _| lot_id != id);
        inner.lots.remove(id);
        Ok(())
    }

    async fn get_lot_bal(&self, id: &str, dt: NaiveDate) -> Result<LotBal, StoreError> {
        check_id(id, "lot")?;
        self.lock()
            .bals
            .get(&(id.to_string(), dt))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "lot balance",
                id: format!("{id} on {dt}"),
            })
    }

    async fn list_lot_bals(
        &self,
        dt: NaiveDate,
        ids: Option<&[String]>,
    ) -> Result<Vec<LotBal>, StoreError> {
        Ok(self
            .lock()
            .bals
            .iter()
            .filter(|((lot_id, bal_dt), _)| {
                *bal_dt == dt && ids.map_or(true, |ids| ids.contains(lot_id))
            })
            .map(|(_, bal)| bal.clone())
            .collect())
    }

    async fn update_lot_bal(&self, bal: &LotBal) -> Result<(), StoreError> {
        check_id(&bal.lot_id, "lot")?;
        let mut inner = self.lock();
        let key = (bal.lot_id.clone(), bal.lot_dt);
        match inner.bals.get_mut(&key) {
            Some(current) => {
                *current = bal.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: "lot balance",
                id: format!("{} on {}", bal.lot_id, bal.lot_dt),
            }),
        }
    }

    async fn create_lot_bal(&self, bal: &LotBal) -> Result<(), StoreError> {
        check_id(&bal.lot_id, "lot")?;
        let mut inner = self.lock();
        let key = (bal.lot_id.clone(), bal.lot_dt);
        if inner.bals.contains_key(&key) {
            // Same failure shape as the lot_bals primary key.
            return Err(StoreError::Internal(format!(
                "duplicate lot balance {} on {}",
                bal.lot_id, bal.lot_dt
            )));
        }
        inner.bals.insert(key, bal.clone());
        Ok(())
    }

    async fn delete_lot_bals(
        &self,
        dt: NaiveDate,
        ids: Option<&[String]>,
    ) -> Result<(), StoreError> {
        self.lock().bals.retain(|(lot_id, bal_dt), _| {
            !(*bal_dt == dt && ids.map_or(true, |ids| ids.contains(lot_id)))
        });
        Ok(())
    }
}
