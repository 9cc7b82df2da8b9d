//! Unit of work: the transaction/lot store contracts bound to one database
//! transaction.
//!
//! The engine's `Process` and `Roll` calls issue several writes that must
//! land or vanish together. [`PgUnitOfWork`] runs them all on a single
//! `sqlx::Transaction`; dropping it without [`commit`](PgUnitOfWork::commit)
//! rolls everything back. Balance reads carry `for update`, so the row locks
//! taken here live until commit.
//!
//! The mutex serializes store calls onto the one underlying connection; the
//! engine is sequential anyway, so it is never contended.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use vgn_models::{Lot, LotBal, LotFilter, Txn, TxnFilter};

use crate::error::StoreError;
use crate::pg;
use crate::traits::{LotStore, TxnStore};

pub struct PgUnitOfWork {
    tx: Mutex<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    /// Begin a database transaction on a pooled connection.
    pub async fn begin(pool: &PgPool) -> Result<Self, StoreError> {
        Ok(Self {
            tx: Mutex::new(pool.begin().await?),
        })
    }

    /// Commit all writes issued through this unit of work.
    pub async fn commit(self) -> Result<(), StoreError> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }
}

#[async_trait]
impl TxnStore for PgUnitOfWork {
    async fn get_txn(&self, id: &str) -> Result<Txn, StoreError> {
        let mut tx = self.tx.lock().await;
        pg::txn::get_txn(&mut tx, id).await
    }

    async fn list_txns(&self, filter: &TxnFilter) -> Result<Vec<Txn>, StoreError> {
        let mut tx = self.tx.lock().await;
        pg::txn::list_txns(&mut tx, filter).await
    }

    async fn update_txn(&self, txn: &Txn, mask: Option<&[String]>) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        pg::txn::update_txn(&mut tx, txn, mask).await
    }

    async fn create_txn(&self, txn: &Txn) -> Result<Txn, StoreError> {
        let mut tx = self.tx.lock().await;
        pg::txn::create_txn(&mut tx, txn).await
    }

    async fn delete_txn(&self, id: &str) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        pg::txn::delete_txn(&mut tx, id).await
    }
}

#[async_trait]
impl LotStore for PgUnitOfWork {
    async fn get_lot(&self, id: &str, dt: Option<NaiveDate>) -> Result<Lot, StoreError> {
        let mut tx = self.tx.lock().await;
        pg::lot::get_lot(&mut tx, id, dt).await
    }

    async fn list_lots(&self, filter: &LotFilter) -> Result<Vec<Lot>, StoreError> {
        let mut tx = self.tx.lock().await;
        pg::lot::list_lots(&mut tx, filter).await
    }

    async fn update_lot(&self, lot: &Lot, mask: Option<&[String]>) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        pg::lot::update_lot(&mut tx, lot, mask).await
    }

    async fn create_lot(&self, lot: &Lot) -> Result<Lot, StoreError> {
        let mut tx = self.tx.lock().await;
        pg::lot::create_lot(&mut tx, lot).await
    }

    async fn delete_lot(&self, id: &str) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        pg::lot::delete_lot(&mut tx, id).await
    }

    async fn get_lot_bal(&self, id: &str, dt: NaiveDate) -> Result<LotBal, StoreError> {
        let mut tx = self.tx.lock().await;
        pg::lot::get_lot_bal(&mut tx, id, dt).await
    }

    async fn list_lot_bals(
        &self,
        dt: NaiveDate,
        ids: Option<&[String]>,
    ) -> Result<Vec<LotBal>, StoreError> {
        let mut tx = self.tx.lock().await;
        pg::lot::list_lot_bals(&mut tx, dt, ids).await
    }

    async fn update_lot_bal(&self, bal: &LotBal) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        pg::lot::update_lot_bal(&mut tx, bal).await
    }

    async fn create_lot_bal(&self, bal: &LotBal) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        pg::lot::create_lot_bal(&mut tx, bal).await
    }

    async fn delete_lot_bals(
        &self,
        dt: NaiveDate,
        ids: Option<&[String]>,
    ) -> Result<(), StoreError> {
        let mut tx = self.tx.lock().await;
        pg::lot::delete_lot_bals(&mut tx, dt, ids).await
    }
}
