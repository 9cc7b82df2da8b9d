//! Shared state for the daemon: one handle per store trait plus the engine.
//!
//! Handlers receive `State<Arc<AppState>>` from axum. The trait objects are
//! the seam the scenario tests use to swap Postgres for the in-memory
//! backend.

use std::sync::Arc;

use sqlx::PgPool;

use vgn_engine::{Engine, PgEngine};
use vgn_store::{
    AcctStore, InstStore, LotStore, OrgStore, PgStore, PortStore, StratStore, TxnStore,
};

/// Static build metadata included in the version response.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Cloneable (Arc) handle shared across all axum handlers.
pub struct AppState {
    pub build: BuildInfo,
    pub orgs: Arc<dyn OrgStore>,
    pub accts: Arc<dyn AcctStore>,
    pub ports: Arc<dyn PortStore>,
    pub strats: Arc<dyn StratStore>,
    pub insts: Arc<dyn InstStore>,
    pub txns: Arc<dyn TxnStore>,
    pub lots: Arc<dyn LotStore>,
    pub engine: Arc<dyn Engine>,
}

impl AppState {
    /// Production wiring: every store over the pool, engine transactional.
    pub fn with_postgres(pool: PgPool) -> Arc<Self> {
        let store = PgStore::new(pool.clone());
        Self::with_stores(store, Arc::new(PgEngine::new(pool)))
    }

    /// Wire all stores from one backend value. Scenario tests pass the
    /// in-memory ledger here with a plain [`vgn_engine::StoreEngine`].
    pub fn with_stores<S>(stores: S, engine: Arc<dyn Engine>) -> Arc<Self>
    where
        S: OrgStore
            + AcctStore
            + PortStore
            + StratStore
            + InstStore
            + TxnStore
            + LotStore
            + Clone
            + 'static,
    {
        Arc::new(Self {
            build: BuildInfo {
                service: "vgn-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            orgs: Arc::new(stores.clone()),
            accts: Arc::new(stores.clone()),
            ports: Arc::new(stores.clone()),
            strats: Arc::new(stores.clone()),
            insts: Arc::new(stores.clone()),
            txns: Arc::new(stores.clone()),
            lots: Arc::new(stores),
            engine,
        })
    }
}
