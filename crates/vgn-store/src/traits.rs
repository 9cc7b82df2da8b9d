//! Store contracts, one trait per entity kind.
//!
//! Every identifier crossing these traits is in *external* form; the
//! implementations own translation to and from internal UUIDs. `Update`
//! with a mask overlays only the named fields onto the current row; with no
//! mask it replaces the mutable columns wholesale.

use async_trait::async_trait;
use chrono::NaiveDate;
use vgn_models::{Acct, Inst, Lot, LotBal, LotFilter, Org, Port, Strat, Txn, TxnFilter};

use crate::error::StoreError;

#[async_trait]
pub trait OrgStore: Send + Sync {
    async fn get_org(&self, id: &str) -> Result<Org, StoreError>;
    async fn list_orgs(&self) -> Result<Vec<Org>, StoreError>;
    async fn update_org(&self, org: &Org, mask: Option<&[String]>) -> Result<(), StoreError>;
    async fn create_org(&self, org: &Org) -> Result<Org, StoreError>;
    async fn delete_org(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AcctStore: Send + Sync {
    async fn get_acct(&self, id: &str) -> Result<Acct, StoreError>;
    async fn list_accts(&self) -> Result<Vec<Acct>, StoreError>;
    async fn update_acct(&self, acct: &Acct, mask: Option<&[String]>) -> Result<(), StoreError>;
    async fn create_acct(&self, acct: &Acct) -> Result<Acct, StoreError>;
    async fn delete_acct(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PortStore: Send + Sync {
    async fn get_port(&self, id: &str) -> Result<Port, StoreError>;
    async fn list_ports(&self) -> Result<Vec<Port>, StoreError>;
    async fn update_port(&self, port: &Port, mask: Option<&[String]>) -> Result<(), StoreError>;
    async fn create_port(&self, port: &Port) -> Result<Port, StoreError>;
    async fn delete_port(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait StratStore: Send + Sync {
    async fn get_strat(&self, id: &str) -> Result<Strat, StoreError>;
    async fn list_strats(&self) -> Result<Vec<Strat>, StoreError>;
    async fn update_strat(&self, strat: &Strat, mask: Option<&[String]>)
        -> Result<(), StoreError>;
    async fn create_strat(&self, strat: &Strat) -> Result<Strat, StoreError>;
    async fn delete_strat(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait InstStore: Send + Sync {
    async fn get_inst(&self, id: &str) -> Result<Inst, StoreError>;
    async fn list_insts(&self) -> Result<Vec<Inst>, StoreError>;
    async fn update_inst(&self, inst: &Inst, mask: Option<&[String]>) -> Result<(), StoreError>;
    async fn create_inst(&self, inst: &Inst) -> Result<Inst, StoreError>;
    async fn delete_inst(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TxnStore: Send + Sync {
    async fn get_txn(&self, id: &str) -> Result<Txn, StoreError>;
    async fn list_txns(&self, filter: &TxnFilter) -> Result<Vec<Txn>, StoreError>;
    async fn update_txn(&self, txn: &Txn, mask: Option<&[String]>) -> Result<(), StoreError>;
    async fn create_txn(&self, txn: &Txn) -> Result<Txn, StoreError>;
    async fn delete_txn(&self, id: &str) -> Result<(), StoreError>;
}

/// Lot reference data plus the per-day balance rows hanging off it.
#[async_trait]
pub trait LotStore: Send + Sync {
    /// Get a lot; when `dt` is given the balance on that date is attached to
    /// the returned lot's `bal` (missing balance → NotFound).
    async fn get_lot(&self, id: &str, dt: Option<NaiveDate>) -> Result<Lot, StoreError>;
    async fn list_lots(&self, filter: &LotFilter) -> Result<Vec<Lot>, StoreError>;
    /// An update carrying `bal` rows updates those balances instead of the
    /// lot row.
    async fn update_lot(&self, lot: &Lot, mask: Option<&[String]>) -> Result<(), StoreError>;
    /// Creating a lot seeds its opening balance on `orig_dt`
    /// (`settled = 0`, `unsettled = orig_size`). A create carrying an id
    /// plus `bal` rows instead seeds balances for an existing lot.
    async fn create_lot(&self, lot: &Lot) -> Result<Lot, StoreError>;
    /// Deleting a lot cascades to its balance rows.
    async fn delete_lot(&self, id: &str) -> Result<(), StoreError>;

    async fn get_lot_bal(&self, id: &str, dt: NaiveDate) -> Result<LotBal, StoreError>;
    /// Balances on `dt`, optionally restricted to `ids`, in ascending
    /// lot-id order.
    async fn list_lot_bals(
        &self,
        dt: NaiveDate,
        ids: Option<&[String]>,
    ) -> Result<Vec<LotBal>, StoreError>;
    async fn update_lot_bal(&self, bal: &LotBal) -> Result<(), StoreError>;
    async fn create_lot_bal(&self, bal: &LotBal) -> Result<(), StoreError>;
    async fn delete_lot_bals(&self, dt: NaiveDate, ids: Option<&[String]>)
        -> Result<(), StoreError>;
}
