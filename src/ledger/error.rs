//! Error types for the ledger module.

use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Asset not found: {asset_type}/{asset_id}")]
    NotFound { asset_type: String, asset_id: String },

    #[error("Version {version} of asset {asset_type}/{asset_id} not found")]
    VersionNotFound {
        asset_type: String,
        asset_id: String,
        version: u64,
    },

    #[error("Version conflict on {asset_type}/{asset_id}: expected {expected}, current {actual}")]
    Conflict {
        asset_type: String,
        asset_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Record version {got} does not follow expected prior version {expected}")]
    OutOfSequence { expected: u64, got: u64 },

    #[error("Invalid asset key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "store")]
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Record encoding error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Ledger not initialized at {0}")]
    NotInitialized(String),

    #[error("Ledger lock poisoned")]
    Poisoned,
}
