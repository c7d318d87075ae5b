//! Convenient re-exports for common usage patterns.
//!
//! ```ignore
//! use asset_ledger::prelude::*;
//!
//! let ledger = FjallLedger::open_or_init(".asset-ledger")?;
//! let service = AssetService::new(ledger, SchemaRegistry::default());
//! ```

pub use crate::error::{Error, Result};

pub use crate::asset::Asset;
pub use crate::diff::{ChangeKind, FieldChange, VersionDiff, diff_pair, diff_sequence};
#[cfg(feature = "store")]
pub use crate::ledger::FjallLedger;
pub use crate::ledger::{Ledger, LedgerError, MemoryLedger, TypeSummary, VersionRecord};
pub use crate::schema::{AssetTypeSchema, SchemaProvider, SchemaRegistry};
pub use crate::service::{AssetService, Identity};
pub use crate::validate::{ValidationError, validate_enforced, validate_required};
pub use crate::value::{Fields, Value, fields};
