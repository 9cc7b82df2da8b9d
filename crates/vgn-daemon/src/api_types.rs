//! Request and response types for the HTTP surface.
//!
//! These are `Serialize + Deserialize` so axum can JSON-encode them and the
//! scenario tests can decode them. No business logic lives here.

use serde::{Deserialize, Serialize};

use vgn_models::{Acct, Inst, Lot, Org, Port, Strat, Txn, TxnState};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body of every non-2xx response: `{error, code}` where `code` is one of
/// `invalid_argument` | `not_found` | `failed_precondition` | `internal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// ---------------------------------------------------------------------------
// GET /v1/version
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

// ---------------------------------------------------------------------------
// List query parameters (transactions and lots)
// ---------------------------------------------------------------------------

/// `filter` is a JSON document per the store filter grammar; `orderBy` is
/// accepted for wire compatibility and not applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListParams {
    pub filter: String,
    pub max_page_size: i32,
    pub page_token: String,
    pub order_by: String,
}

// ---------------------------------------------------------------------------
// Update request bodies: entity + optional field mask
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrgRequest {
    pub org: Org,
    #[serde(default)]
    pub update_mask: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAcctRequest {
    pub acct: Acct,
    #[serde(default)]
    pub update_mask: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePortRequest {
    pub port: Port,
    #[serde(default)]
    pub update_mask: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStratRequest {
    pub strat: Strat,
    #[serde(default)]
    pub update_mask: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInstRequest {
    pub inst: Inst,
    #[serde(default)]
    pub update_mask: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTxnRequest {
    pub txn: Txn,
    #[serde(default)]
    pub update_mask: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLotRequest {
    pub lot: Lot,
    #[serde(default)]
    pub update_mask: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// POST /v1/txns/:id/process
// ---------------------------------------------------------------------------

/// Body is optional; `lotIds` is the ordered sell candidate list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessRequest {
    pub lot_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub id: String,
    pub state: TxnState,
}

// ---------------------------------------------------------------------------
// POST /v1/lots/roll
// ---------------------------------------------------------------------------

/// `dt` stays a string so an empty date can be refused with a clear
/// InvalidArgument instead of a deserialization error. Direction defaults
/// to forward.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RollRequest {
    pub dt: String,
    pub direction: Option<String>,
    pub lot_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollResponse {
    pub status: String,
}
