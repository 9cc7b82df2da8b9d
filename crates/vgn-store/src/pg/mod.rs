//! Postgres store implementations.
//!
//! Every function in the submodules takes `&mut PgConnection`, so the same
//! SQL serves both the pool-backed [`PgStore`] and the transaction-backed
//! [`crate::PgUnitOfWork`]. Identifier translation to and from external form
//! happens here, at the storage boundary, and nowhere else.

use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::error::StoreError;

pub mod inst;
pub mod lot;
pub mod tree;
pub mod txn;

/// Pool-backed implementation of every store trait. Stateless beyond the
/// pool handle; cheap to clone.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn conn(&self) -> Result<PoolConnection<Postgres>, StoreError> {
        Ok(self.pool.acquire().await?)
    }
}

// ---------------------------------------------------------------------------
// Identifier translation helpers
// ---------------------------------------------------------------------------

/// Decode a required external id to its storage UUID.
pub(crate) fn to_vid(vxid: &str, what: &'static str) -> Result<Uuid, StoreError> {
    if vxid.is_empty() {
        return Err(StoreError::InvalidArgument(format!("missing {what}")));
    }
    let vid = vgn_vxid::decode(vxid)?;
    Uuid::parse_str(&vid)
        .map_err(|_| StoreError::Internal(format!("decoded {what} {vxid:?} is not a uuid")))
}

/// Decode an optional external id; `None` and the empty string both map to
/// a NULL column.
pub(crate) fn to_vid_opt(
    vxid: Option<&str>,
    what: &'static str,
) -> Result<Option<Uuid>, StoreError> {
    match vxid {
        None | Some("") => Ok(None),
        Some(s) => to_vid(s, what).map(Some),
    }
}

/// Decode a slice of external ids (filter values).
pub(crate) fn to_vids(vxids: &[String], what: &'static str) -> Result<Vec<Uuid>, StoreError> {
    vxids.iter().map(|v| to_vid(v, what)).collect()
}

/// Encode a storage UUID to external form.
pub(crate) fn to_vxid(vid: Uuid, pfx: &str) -> Result<String, StoreError> {
    Ok(vgn_vxid::encode(&vid.to_string(), pfx)?)
}

/// Encode an optional storage UUID to external form.
pub(crate) fn to_vxid_opt(vid: Option<Uuid>, pfx: &str) -> Result<Option<String>, StoreError> {
    vid.map(|v| to_vxid(v, pfx)).transpose()
}
