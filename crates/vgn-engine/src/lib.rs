//! Transaction processing engine and lot-roll operator.
//!
//! [`Processor`] holds the per-call logic; the [`Engine`] trait is the
//! surface the facade talks to. Two implementations:
//!
//! - [`StoreEngine`] runs directly over any `TxnStore + LotStore` pair with
//!   no atomicity of its own — each store call commits independently. This
//!   serves the in-memory backend.
//! - [`PgEngine`] wraps every call in a [`PgUnitOfWork`], so a failed
//!   `process` or `roll` leaves nothing behind: the transaction drops and
//!   rolls back.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use vgn_models::RollDirection;
use vgn_store::{LotStore, PgUnitOfWork, TxnStore};

pub mod error;
pub mod processor;
mod roll;

pub use error::EngineError;
pub use processor::{ProcessOutcome, Processor};

/// The engine surface exposed to the facade.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Process one open transaction; `lot_ids` is the sell candidate list.
    async fn process(
        &self,
        id: &str,
        lot_ids: Option<&[String]>,
    ) -> Result<ProcessOutcome, EngineError>;

    /// Roll lot balances forward from `dt`, or delete the rows on `dt`.
    async fn roll_lots(
        &self,
        dt: NaiveDate,
        direction: RollDirection,
        lot_ids: Option<&[String]>,
    ) -> Result<(), EngineError>;
}

// ---------------------------------------------------------------------------
// StoreEngine
// ---------------------------------------------------------------------------

/// Engine over a plain store pair. No transaction wrapping: side effects
/// issued before a failure stay visible. Callers wanting atomicity use
/// [`PgEngine`].
pub struct StoreEngine<S> {
    stores: S,
}

impl<S> StoreEngine<S>
where
    S: TxnStore + LotStore,
{
    pub fn new(stores: S) -> Self {
        Self { stores }
    }
}

#[async_trait]
impl<S> Engine for StoreEngine<S>
where
    S: TxnStore + LotStore,
{
    async fn process(
        &self,
        id: &str,
        lot_ids: Option<&[String]>,
    ) -> Result<ProcessOutcome, EngineError> {
        Processor::new(&self.stores, &self.stores)
            .process(id, lot_ids)
            .await
    }

    async fn roll_lots(
        &self,
        dt: NaiveDate,
        direction: RollDirection,
        lot_ids: Option<&[String]>,
    ) -> Result<(), EngineError> {
        roll::roll_lots(&self.stores, dt, direction, lot_ids).await
    }
}

// ---------------------------------------------------------------------------
// PgEngine
// ---------------------------------------------------------------------------

/// Engine over Postgres, one database transaction per call.
///
/// Balance reads inside the unit of work lock their rows until commit, and
/// both the sell and settle paths touch balances in ascending lot-id order,
/// so concurrent calls over overlapping lots serialize instead of
/// deadlocking.
pub struct PgEngine {
    pool: PgPool,
}

impl PgEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Engine for PgEngine {
    async fn process(
        &self,
        id: &str,
        lot_ids: Option<&[String]>,
    ) -> Result<ProcessOutcome, EngineError> {
        let uow = PgUnitOfWork::begin(&self.pool).await?;
        let outcome = Processor::new(&uow, &uow).process(id, lot_ids).await?;
        uow.commit().await?;
        Ok(outcome)
    }

    async fn roll_lots(
        &self,
        dt: NaiveDate,
        direction: RollDirection,
        lot_ids: Option<&[String]>,
    ) -> Result<(), EngineError> {
        let uow = PgUnitOfWork::begin(&self.pool).await?;
        roll::roll_lots(&uow, dt, direction, lot_ids).await?;
        uow.commit().await?;
        Ok(())
    }
}
