//! Unified error type for the asset-ledger library.
//!
//! Every failure of an [`AssetService`](crate::service::AssetService)
//! operation is one of these variants. Only [`Error::Conflict`] is worth
//! retrying, and only after reloading the latest state.

use thiserror::Error;

use crate::ledger::LedgerError;
use crate::validate::ValidationError;

/// Unified error type for all asset operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The asset, or the requested version of it, does not exist or has been
    /// deleted.
    #[error("Asset not found: {asset_type}/{asset_id}{}", version_suffix(.version))]
    NotFound {
        asset_type: String,
        asset_id: String,
        version: Option<u64>,
    },

    /// User data violates the type's schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Creating the first asset of a new type is not allowed for this caller.
    #[error("Creating assets of new type '{0}' requires admin or import mode")]
    ForbiddenType(String),

    /// An asset with this id is live already.
    #[error("Asset already exists: {asset_type}/{asset_id}")]
    AlreadyExists { asset_type: String, asset_id: String },

    /// Another writer appended first; reload and retry.
    #[error("Version conflict on {asset_type}/{asset_id}: expected {expected}, current {actual}")]
    Conflict {
        asset_type: String,
        asset_id: String,
        expected: u64,
        actual: u64,
    },

    /// An edit carried neither data nor fields to delete.
    #[error("Edit must include data or fields to delete")]
    EmptyEdit,

    /// Storage failure.
    #[error(transparent)]
    Ledger(LedgerError),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

fn version_suffix(version: &Option<u64>) -> String {
    version.map(|v| format!(" version {}", v)).unwrap_or_default()
}

impl From<LedgerError> for Error {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound {
                asset_type,
                asset_id,
            } => Self::NotFound {
                asset_type,
                asset_id,
                version: None,
            },
            LedgerError::VersionNotFound {
                asset_type,
                asset_id,
                version,
            } => Self::NotFound {
                asset_type,
                asset_id,
                version: Some(version),
            },
            LedgerError::Conflict {
                asset_type,
                asset_id,
                expected,
                actual,
            } => Self::Conflict {
                asset_type,
                asset_id,
                expected,
                actual,
            },
            other => Self::Ledger(other),
        }
    }
}

impl Error {
    pub(crate) fn not_found(asset_type: &str, asset_id: &str) -> Self {
        Self::NotFound {
            asset_type: asset_type.to_string(),
            asset_id: asset_id.to_string(),
            version: None,
        }
    }

    /// Returns `true` if the caller may retry after reloading state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a schema violation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
