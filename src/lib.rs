//! A versioned catalog of schema-light assets.
//!
//! Assets are records identified by a type and an id, holding an open set
//! of fields. Every create, edit or delete appends an immutable
//! [`VersionRecord`] to the asset's history, so any past state can be read
//! back and any two states can be diffed.
//!
//! # Quick Start
//!
//! ```
//! use asset_ledger::prelude::*;
//!
//! let service = AssetService::new(MemoryLedger::new(), SchemaRegistry::default());
//! let admin = Identity::admin("ops");
//!
//! let data = fields([("name", Value::from("h1")), ("ip", Value::from("10.0.0.1"))]);
//! service.create("host", "h1", data, &admin, false)?;
//!
//! service.edit("host", "h1", fields([("ip", Value::from("10.0.0.2"))]), &[], &admin)?;
//! let diff = service.diff_between("host", "h1", 1, 2)?;
//! assert_eq!(diff.changes.len(), 1);
//! # Ok::<(), asset_ledger::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`value`] - Tagged field values and field maps
//! - [`schema`] - Per-type required and enforced fields
//! - [`validate`] - Field validation against a schema
//! - [`ledger`] - Append-only version storage (in-memory, or fjall with `store`)
//! - [`diff`] - Structural diffs between versions
//! - [`service`] - Create/get/edit/delete operations
//! - [`server`] - HTTP API (requires `server` feature)
//!
//! # Feature Flags
//!
//! - `store` - Enable the fjall-backed ledger (enabled by default)
//! - `cli` - Enable the command-line interface binary
//! - `server` - Enable the HTTP API server
//! - `full` - Enable all features

pub mod asset;
pub mod diff;
mod error;
pub mod ledger;
pub mod prelude;
pub mod schema;
#[cfg(feature = "server")]
pub mod server;
pub mod service;
pub mod validate;
pub mod value;

pub use error::{Error, Result};

pub use asset::Asset;
pub use diff::{ChangeKind, FieldChange, VersionDiff};
#[cfg(feature = "store")]
pub use ledger::FjallLedger;
pub use ledger::{Ledger, LedgerError, MemoryLedger, TypeSummary, VersionRecord};
pub use schema::{AssetTypeSchema, SchemaProvider, SchemaRegistry};
pub use service::{AssetService, Identity};
pub use validate::ValidationError;
pub use value::{Fields, Value};
