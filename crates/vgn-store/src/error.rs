//! Store error type and the caller-visible error kinds.

use thiserror::Error;
use vgn_vxid::VxidError;

/// The four error kinds surfaced to callers. The facade maps these to HTTP
/// status codes; nothing in between remaps them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    FailedPrecondition,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::FailedPrecondition => "failed_precondition",
            Self::Internal => "internal",
        }
    }
}

/// Errors produced by the entity stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Db(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Db(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<VxidError> for StoreError {
    fn from(err: VxidError) -> Self {
        match err {
            // A prefix-length mismatch or an out-of-alphabet character is the
            // caller's input; an overflowing numeral looks well-formed and is
            // treated as corruption.
            VxidError::Malformed { .. } | VxidError::PrefixLenMismatch { .. } => {
                Self::InvalidArgument(err.to_string())
            }
            VxidError::Overflow { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<vgn_models::MaskError> for StoreError {
    fn from(err: vgn_models::MaskError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<vgn_models::enums::UnknownVariant> for StoreError {
    fn from(err: vgn_models::enums::UnknownVariant) -> Self {
        // Enum strings are validated on the way in, so an unknown variant
        // here means the database row itself is bad.
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_as_documented() {
        let nf = StoreError::NotFound {
            entity: "lot",
            id: "lot_x".into(),
        };
        assert_eq!(nf.kind(), ErrorKind::NotFound);
        assert_eq!(nf.to_string(), "lot with id lot_x not found");

        assert_eq!(
            StoreError::InvalidArgument("bad".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            StoreError::Internal("boom".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn vxid_errors_split_by_shape() {
        let malformed = StoreError::from(VxidError::Malformed {
            input: "x".into(),
        });
        assert_eq!(malformed.kind(), ErrorKind::InvalidArgument);

        let overflow = StoreError::from(VxidError::Overflow { input: "z".into() });
        assert_eq!(overflow.kind(), ErrorKind::Internal);
    }
}
