//! Engine error type.
//!
//! Invariant violations are FailedPrecondition; malformed input is
//! InvalidArgument; store errors keep the kind the store assigned. Callers
//! MUST treat FailedPrecondition from the engine as a data problem needing
//! operator attention, not a retry candidate.

use thiserror::Error;
use vgn_models::{TxnState, TxnType};
use vgn_store::{ErrorKind, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    /// Only `open` transactions are processed.
    #[error("transaction {id} is {state}, not open")]
    NotOpen { id: String, state: TxnState },

    /// The dispatch matrix has no arm for this type/subtype pair.
    #[error("transaction {id}: unsupported dispatch {txn_type}/{sub_type}")]
    Unsupported {
        id: String,
        txn_type: TxnType,
        sub_type: String,
    },

    /// A field the dispatch arm depends on is absent.
    #[error("transaction {id} is missing {field}")]
    MissingField { id: String, field: &'static str },

    /// The candidate lot list ran out before the sell size was covered.
    #[error("sell {id} under-allocated: {remaining} of {requested} uncovered")]
    UnderAllocated {
        id: String,
        requested: f64,
        remaining: f64,
    },

    /// Σ allocation sizes must equal the parent's size exactly.
    #[error("settling {id}: allocations total {found}, parent expects {expected}")]
    SizeConservation {
        id: String,
        expected: f64,
        found: f64,
    },

    /// A sweep's source cash must be fully settled on the settle date.
    #[error("source cash lot {lot_id} has unsettled size while processing txn {id}")]
    UnsettledSweep { id: String, lot_id: String },

    /// The funding lot's balance must equal the reinvest's net settle amount.
    #[error("funding lot {lot_id} for reinvest txn {id} not the same size: {found} != {expected}")]
    ReinvestFundingMismatch {
        id: String,
        lot_id: String,
        expected: f64,
        found: f64,
    },

    /// No payable/receivable lot found for the settling parent.
    #[error("no payable/receivable lot found for txn {id} with parent {parent_id}")]
    PayRecMissing { id: String, parent_id: String },

    /// More than one payable/receivable lot — an integrity breach.
    #[error("found {count} payable/receivable lots processing txn {id} with parent {parent_id}")]
    PayRecAmbiguous {
        id: String,
        parent_id: String,
        count: usize,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOpen { .. }
            | Self::UnderAllocated { .. }
            | Self::SizeConservation { .. }
            | Self::UnsettledSweep { .. }
            | Self::ReinvestFundingMismatch { .. }
            | Self::PayRecMissing { .. }
            | Self::PayRecAmbiguous { .. } => ErrorKind::FailedPrecondition,
            Self::Unsupported { .. } | Self::MissingField { .. } => ErrorKind::InvalidArgument,
            Self::Store(err) => err.kind(),
        }
    }
}
