//! Append-only version ledger.
//!
//! Each `(asset_type, asset_id)` pair owns an independent, gapless sequence
//! of [`VersionRecord`]s starting at 1. Records are never rewritten or
//! removed; deletion is a tombstoned record appended like any other write.
//!
//! The only concurrency primitive is [`Ledger::append_if_current`]: a write
//! is admitted when the caller's view of the latest version still matches
//! the ledger, so racing writers on the same prior version see exactly one
//! winner.

mod error;
mod memory;
mod record;
#[cfg(feature = "store")]
mod store;

use serde::Serialize;

pub use error::LedgerError;
pub use memory::MemoryLedger;
pub use record::{AUDIT_FIELDS, VERSION_FIELD, VersionRecord, is_reserved_field};
#[cfg(feature = "store")]
pub use store::FjallLedger;

/// Number of live assets of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub name: String,
    pub count: u64,
}

/// Storage backend holding every asset's version history.
pub trait Ledger: Send + Sync {
    /// Latest record of an asset, tombstoned or not.
    fn get_latest(&self, asset_type: &str, asset_id: &str) -> Result<VersionRecord, LedgerError>;

    /// A specific historical record.
    fn get_version(
        &self,
        asset_type: &str,
        asset_id: &str,
        version: u64,
    ) -> Result<VersionRecord, LedgerError>;

    /// Up to `limit` records, newest first. Empty when the asset has none.
    fn list_recent(
        &self,
        asset_type: &str,
        asset_id: &str,
        limit: usize,
    ) -> Result<Vec<VersionRecord>, LedgerError>;

    /// Append `record` if the latest stored version equals `expected_prior`
    /// (`0` when the asset has no records yet).
    ///
    /// Returns the appended version.
    fn append_if_current(
        &self,
        expected_prior: u64,
        record: VersionRecord,
    ) -> Result<u64, LedgerError>;

    /// Whether any asset of this type was ever written.
    fn type_exists(&self, asset_type: &str) -> Result<bool, LedgerError>;

    /// Known types with their live asset counts, sorted by name.
    fn list_types(&self) -> Result<Vec<TypeSummary>, LedgerError>;
}

/// Reject identity components the backends cannot key on.
pub(crate) fn check_key(asset_type: &str, asset_id: &str) -> Result<(), LedgerError> {
    for (what, part) in [("asset type", asset_type), ("asset id", asset_id)] {
        if part.is_empty() {
            return Err(LedgerError::InvalidKey(format!("{} is empty", what)));
        }
        if part.contains('\0') {
            return Err(LedgerError::InvalidKey(format!("{} contains NUL", what)));
        }
    }
    Ok(())
}

/// Check that `record` is the direct successor of `expected_prior` and that
/// the ledger has not moved past it.
pub(crate) fn check_append(
    expected_prior: u64,
    actual: u64,
    record: &VersionRecord,
) -> Result<(), LedgerError> {
    if record.version != expected_prior + 1 {
        return Err(LedgerError::OutOfSequence {
            expected: expected_prior,
            got: record.version,
        });
    }
    if actual != expected_prior {
        return Err(LedgerError::Conflict {
            asset_type: record.asset_type.clone(),
            asset_id: record.asset_id.clone(),
            expected: expected_prior,
            actual,
        });
    }
    Ok(())
}
