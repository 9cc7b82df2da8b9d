//! Postgres persistence for the varangian ledger.
//!
//! [`PgStore`] implements every store trait over a shared [`sqlx::PgPool`];
//! [`PgUnitOfWork`] implements the transaction/lot traits inside a single
//! database transaction so the engine's side effects commit or roll back as
//! one. All SQL lives in `pg/`; traits and error kinds are defined here and
//! re-used by the in-memory testkit backend.

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

pub mod error;
pub mod pg;
pub mod traits;
pub mod uow;

pub use error::{ErrorKind, StoreError};
pub use pg::PgStore;
pub use traits::{AcctStore, InstStore, LotStore, OrgStore, PortStore, StratStore, TxnStore};
pub use uow::PgUnitOfWork;

/// Connect to Postgres with the given connection string.
pub async fn connect(conn_str: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(conn_str)
        .await
        .context("failed to connect to Postgres")?;

    info!("database pool ready");
    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}
