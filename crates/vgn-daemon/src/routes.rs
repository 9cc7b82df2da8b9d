//! Axum router and all HTTP handlers.
//!
//! `build_router` is the single entry point; `main.rs` calls it and
//! attaches middleware layers. Handlers are thin per the facade contract:
//! reject a Create carrying an id, overwrite the body id with the URL id on
//! Update, translate store/engine errors to status codes, and nothing else.
//! All handlers are `pub(crate)`-via-module so the scenario tests in
//! `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use tracing::warn;

use vgn_models::{Inst, Lot, LotFilter, RollDirection, Txn, TxnFilter};
use vgn_store::ErrorKind;

use crate::api_types::{
    ErrorResponse, ListParams, ProcessRequest, ProcessResponse, RollRequest, RollResponse,
    UpdateAcctRequest, UpdateInstRequest, UpdateLotRequest, UpdateOrgRequest, UpdatePortRequest,
    UpdateStratRequest, UpdateTxnRequest, VersionResponse,
};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware (tracing) is **not** applied here; `main.rs` attaches it
/// after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/version", get(version))
        .route("/v1/orgs", get(org::list).post(org::create))
        .route(
            "/v1/orgs/:id",
            get(org::get_one).patch(org::update).delete(org::delete),
        )
        .route("/v1/accts", get(acct::list).post(acct::create))
        .route(
            "/v1/accts/:id",
            get(acct::get_one).patch(acct::update).delete(acct::delete),
        )
        .route("/v1/ports", get(port::list).post(port::create))
        .route(
            "/v1/ports/:id",
            get(port::get_one).patch(port::update).delete(port::delete),
        )
        .route("/v1/strats", get(strat::list).post(strat::create))
        .route(
            "/v1/strats/:id",
            get(strat::get_one)
                .patch(strat::update)
                .delete(strat::delete),
        )
        .route("/v1/insts", get(inst::list).post(inst::create))
        .route(
            "/v1/insts/:id",
            get(inst::get_one).patch(inst::update).delete(inst::delete),
        )
        .route("/v1/txns", get(list_txns).post(create_txn))
        .route(
            "/v1/txns/:id",
            get(get_txn).patch(update_txn).delete(delete_txn),
        )
        .route("/v1/txns/:id/process", axum::routing::post(process_txn))
        .route("/v1/lots", get(list_lots).post(create_lot))
        .route(
            "/v1/lots/:id",
            get(get_lot).patch(update_lot).delete(delete_lot),
        )
        .route("/v1/lots/roll", axum::routing::post(roll_lots))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Error envelope every handler returns. Kinds map onto HTTP status:
/// InvalidArgument 400, NotFound 404, FailedPrecondition 412, Internal 500.
#[derive(Debug)]
pub(crate) struct ApiError {
    kind: ErrorKind,
    message: String,
}

impl ApiError {
    fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidArgument,
            message: message.into(),
        }
    }
}

impl From<vgn_store::StoreError> for ApiError {
    fn from(err: vgn_store::StoreError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<vgn_engine::EngineError> for ApiError {
    fn from(err: vgn_engine::EngineError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.kind {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::FailedPrecondition => StatusCode::PRECONDITION_FAILED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if self.kind == ErrorKind::Internal {
            warn!(error = %self.message, "internal error");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.message,
                code: self.kind.as_str().to_string(),
            }),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// GET /v1/version
// ---------------------------------------------------------------------------

pub(crate) async fn version(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    Json(VersionResponse {
        version: st.build.version.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Reference entity CRUD (orgs, accts, ports, strats, insts)
// ---------------------------------------------------------------------------

macro_rules! crud_module {
    ($mod_name:ident, $ty:ty, $store:ident, $req:ident, $field:ident,
     $getm:ident, $listm:ident, $updatem:ident, $createm:ident, $deletem:ident) => {
        pub(crate) mod $mod_name {
            use super::*;

            pub(crate) async fn list(
                State(st): State<Arc<AppState>>,
            ) -> Result<Json<Vec<$ty>>, ApiError> {
                Ok(Json(st.$store.$listm().await?))
            }

            pub(crate) async fn get_one(
                State(st): State<Arc<AppState>>,
                Path(id): Path<String>,
            ) -> Result<Json<$ty>, ApiError> {
                Ok(Json(st.$store.$getm(&id).await?))
            }

            pub(crate) async fn create(
                State(st): State<Arc<AppState>>,
                Json(body): Json<$ty>,
            ) -> Result<Json<$ty>, ApiError> {
                if !body.id.is_empty() {
                    return Err(ApiError::invalid_argument(concat!(
                        stringify!($mod_name),
                        " id is not expected in POST"
                    )));
                }
                Ok(Json(st.$store.$createm(&body).await?))
            }

            pub(crate) async fn update(
                State(st): State<Arc<AppState>>,
                Path(id): Path<String>,
                Json(body): Json<$req>,
            ) -> Result<StatusCode, ApiError> {
                let mut entity = body.$field;
                // The URL id wins: clients cannot rename through the body.
                entity.id = id;
                st.$store
                    .$updatem(&entity, body.update_mask.as_deref())
                    .await?;
                Ok(StatusCode::NO_CONTENT)
            }

            pub(crate) async fn delete(
                State(st): State<Arc<AppState>>,
                Path(id): Path<String>,
            ) -> Result<StatusCode, ApiError> {
                st.$store.$deletem(&id).await?;
                Ok(StatusCode::NO_CONTENT)
            }
        }
    };
}

crud_module!(org, vgn_models::Org, orgs, UpdateOrgRequest, org,
    get_org, list_orgs, update_org, create_org, delete_org);
crud_module!(acct, vgn_models::Acct, accts, UpdateAcctRequest, acct,
    get_acct, list_accts, update_acct, create_acct, delete_acct);
crud_module!(port, vgn_models::Port, ports, UpdatePortRequest, port,
    get_port, list_ports, update_port, create_port, delete_port);
crud_module!(strat, vgn_models::Strat, strats, UpdateStratRequest, strat,
    get_strat, list_strats, update_strat, create_strat, delete_strat);
crud_module!(inst, Inst, insts, UpdateInstRequest, inst,
    get_inst, list_insts, update_inst, create_inst, delete_inst);

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

pub(crate) async fn get_txn(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Txn>, ApiError> {
    Ok(Json(st.txns.get_txn(&id).await?))
}

pub(crate) async fn list_txns(
    State(st): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Txn>>, ApiError> {
    let mut filter = TxnFilter::from_json(&params.filter)
        .map_err(|e| ApiError::invalid_argument(format!("malformed filter: {e}")))?;
    if filter.page_size == 0 {
        filter.page_size = params.max_page_size;
    }

    Ok(Json(st.txns.list_txns(&filter).await?))
}

pub(crate) async fn create_txn(
    State(st): State<Arc<AppState>>,
    Json(body): Json<Txn>,
) -> Result<Json<Txn>, ApiError> {
    if !body.id.is_empty() {
        return Err(ApiError::invalid_argument("txn id is not expected in POST"));
    }
    Ok(Json(st.txns.create_txn(&body).await?))
}

pub(crate) async fn update_txn(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTxnRequest>,
) -> Result<StatusCode, ApiError> {
    let mut txn = body.txn;
    txn.id = id;
    st.txns.update_txn(&txn, body.update_mask.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn delete_txn(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    st.txns.delete_txn(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn process_txn(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<ProcessRequest>>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let lot_ids = body.and_then(|Json(b)| b.lot_ids);

    let outcome = st.engine.process(&id, lot_ids.as_deref()).await?;

    Ok(Json(ProcessResponse {
        id: outcome.id,
        state: outcome.state,
    }))
}

// ---------------------------------------------------------------------------
// Lots
// ---------------------------------------------------------------------------

#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct GetLotParams {
    dt: Option<NaiveDate>,
}

pub(crate) async fn get_lot(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<GetLotParams>,
) -> Result<Json<Lot>, ApiError> {
    Ok(Json(st.lots.get_lot(&id, params.dt).await?))
}

pub(crate) async fn list_lots(
    State(st): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Lot>>, ApiError> {
    let mut filter = LotFilter::from_json(&params.filter)
        .map_err(|e| ApiError::invalid_argument(format!("malformed filter: {e}")))?;
    if filter.page_size == 0 {
        filter.page_size = params.max_page_size;
    }

    Ok(Json(st.lots.list_lots(&filter).await?))
}

pub(crate) async fn create_lot(
    State(st): State<Arc<AppState>>,
    Json(body): Json<Lot>,
) -> Result<Json<Lot>, ApiError> {
    // A lot id is only legal in the balance-seeding form (id + bal rows).
    if !body.id.is_empty() && body.bal.is_empty() {
        return Err(ApiError::invalid_argument("lot id is not expected in POST"));
    }
    Ok(Json(st.lots.create_lot(&body).await?))
}

pub(crate) async fn update_lot(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateLotRequest>,
) -> Result<StatusCode, ApiError> {
    let mut lot = body.lot;
    lot.id = id;
    st.lots.update_lot(&lot, body.update_mask.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn delete_lot(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    st.lots.delete_lot(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn roll_lots(
    State(st): State<Arc<AppState>>,
    Json(body): Json<RollRequest>,
) -> Result<Json<RollResponse>, ApiError> {
    if body.dt.is_empty() {
        return Err(ApiError::invalid_argument("roll date expected in POST"));
    }
    let dt: NaiveDate = body
        .dt
        .parse()
        .map_err(|_| ApiError::invalid_argument(format!("roll date {:?} is not YYYY-MM-DD", body.dt)))?;

    let direction = match body.direction.as_deref() {
        None | Some("") => RollDirection::default(),
        Some(s) => s
            .parse()
            .map_err(|e: vgn_models::enums::UnknownVariant| ApiError::invalid_argument(e.to_string()))?,
    };

    st.engine
        .roll_lots(dt, direction, body.lot_ids.as_deref())
        .await?;

    Ok(Json(RollResponse {
        status: "completed".to_string(),
    }))
}
