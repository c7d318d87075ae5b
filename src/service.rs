//! Asset operations on top of a [`Ledger`].
//!
//! Every state change is one `append_if_current` call built from the
//! latest record the service read. No lock is held between that read and
//! the append: a concurrent writer makes the append fail with
//! [`Error::Conflict`] instead, and the caller decides whether to reload
//! and try again.

use chrono::Utc;
use tracing::{debug, info};

use crate::asset::Asset;
use crate::diff::{VersionDiff, diff_pair, diff_sequence};
use crate::error::{Error, Result};
use crate::ledger::{Ledger, LedgerError, TypeSummary, VersionRecord, is_reserved_field};
use crate::schema::SchemaProvider;
use crate::validate::{validate_enforced, validate_required};
use crate::value::Fields;

/// Number of versions returned when the caller gives no limit.
pub const DEFAULT_RESULT_SIZE: usize = 10;

/// Authenticated caller, resolved outside this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub is_admin: bool,
}

impl Identity {
    pub fn user(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            is_admin: false,
        }
    }

    pub fn admin(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            is_admin: true,
        }
    }
}

/// Create, read, edit and delete versioned assets.
pub struct AssetService<L, S> {
    ledger: L,
    schemas: S,
    default_result_size: usize,
}

impl<L: Ledger, S: SchemaProvider> AssetService<L, S> {
    pub fn new(ledger: L, schemas: S) -> Self {
        Self {
            ledger,
            schemas,
            default_result_size: DEFAULT_RESULT_SIZE,
        }
    }

    /// Set the version count used by [`get_versions`](Self::get_versions)
    /// when no limit is given.
    pub fn with_default_result_size(mut self, size: usize) -> Self {
        self.default_result_size = size;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Create an asset and return its version.
    ///
    /// The first asset of a type nobody has written yet needs an admin
    /// caller or `import` mode, unless the type's schema lifts that
    /// requirement. An id whose latest record is a tombstone may be created
    /// again; numbering continues after the tombstone.
    pub fn create(
        &self,
        asset_type: &str,
        asset_id: &str,
        data: Fields,
        identity: &Identity,
        import: bool,
    ) -> Result<u64> {
        let data = strip_reserved(data);
        let schema = self.schemas.schema(asset_type);
        validate_required(schema, &data)?;
        validate_enforced(schema, &data)?;

        if schema.auto_create_requires_admin
            && !identity.is_admin
            && !import
            && !self.ledger.type_exists(asset_type)?
        {
            debug!(asset_type, user = %identity.user, "refusing to create new type");
            return Err(Error::ForbiddenType(asset_type.to_string()));
        }

        let prior = match self.ledger.get_latest(asset_type, asset_id) {
            Ok(latest) if latest.tombstone => latest.version,
            Ok(_) => return Err(already_exists(asset_type, asset_id)),
            Err(LedgerError::NotFound { .. }) => 0,
            Err(e) => return Err(e.into()),
        };

        let record = VersionRecord::genesis(
            asset_type,
            asset_id,
            prior + 1,
            data,
            &identity.user,
            Utc::now(),
        );
        let version = self
            .ledger
            .append_if_current(prior, record)
            .map_err(|e| match e {
                LedgerError::Conflict { .. } => already_exists(asset_type, asset_id),
                other => other.into(),
            })?;

        info!(asset_type, asset_id, version, user = %identity.user, import, "asset created");
        Ok(version)
    }

    /// Current state of an asset. Deleted assets are not found.
    pub fn get(&self, asset_type: &str, asset_id: &str) -> Result<Asset> {
        self.live_latest(asset_type, asset_id).map(Asset::from_record)
    }

    /// State of an asset at a specific version, including tombstones.
    pub fn get_version(&self, asset_type: &str, asset_id: &str, version: u64) -> Result<Asset> {
        let record = self.ledger.get_version(asset_type, asset_id, version)?;
        Ok(Asset::from_record(record))
    }

    /// Most recent records of an asset, newest first.
    ///
    /// An asset without history yields an empty list.
    pub fn get_versions(
        &self,
        asset_type: &str,
        asset_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<VersionRecord>> {
        let limit = limit.unwrap_or(self.default_result_size);
        Ok(self.ledger.list_recent(asset_type, asset_id, limit)?)
    }

    /// Overlay `data` on the current state, drop `delete_fields`, and append
    /// the result.
    ///
    /// A field named both in `data` and in `delete_fields` is deleted. The
    /// required-field check does not run on edits; enforced values are
    /// checked on the merged result.
    pub fn edit(
        &self,
        asset_type: &str,
        asset_id: &str,
        data: Fields,
        delete_fields: &[String],
        identity: &Identity,
    ) -> Result<u64> {
        let data = strip_reserved(data);
        if data.is_empty() && delete_fields.is_empty() {
            return Err(Error::EmptyEdit);
        }

        let current = self.live_latest(asset_type, asset_id)?;
        let mut merged = current.data.clone();
        merged.extend(data);
        for field in delete_fields {
            merged.remove(field);
        }
        validate_enforced(self.schemas.schema(asset_type), &merged)?;

        let record = current.successor(merged, &identity.user, Utc::now());
        let version = self.ledger.append_if_current(current.version, record)?;

        info!(asset_type, asset_id, version, user = %identity.user, "asset edited");
        Ok(version)
    }

    /// Delete an asset by appending a tombstone that keeps its last data.
    pub fn remove(&self, asset_type: &str, asset_id: &str, identity: &Identity) -> Result<u64> {
        let current = self.live_latest(asset_type, asset_id)?;
        let record = current.tombstoned(&identity.user, Utc::now());
        let version = self.ledger.append_if_current(current.version, record)?;

        info!(asset_type, asset_id, version, user = %identity.user, "asset removed");
        Ok(version)
    }

    /// Diffs between consecutive versions of the most recent `limit`
    /// records, oldest pair first.
    pub fn diff_versions(
        &self,
        asset_type: &str,
        asset_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<VersionDiff>> {
        let mut records = self.get_versions(asset_type, asset_id, limit)?;
        records.reverse();
        Ok(diff_sequence(&records))
    }

    /// Diff two arbitrary versions of one asset.
    pub fn diff_between(
        &self,
        asset_type: &str,
        asset_id: &str,
        from: u64,
        to: u64,
    ) -> Result<VersionDiff> {
        let older = self.ledger.get_version(asset_type, asset_id, from)?;
        let newer = self.ledger.get_version(asset_type, asset_id, to)?;
        Ok(diff_pair(&older, &newer))
    }

    /// Asset types with their live asset counts.
    pub fn list_types(&self) -> Result<Vec<TypeSummary>> {
        Ok(self.ledger.list_types()?)
    }

    fn live_latest(&self, asset_type: &str, asset_id: &str) -> Result<VersionRecord> {
        let latest = self.ledger.get_latest(asset_type, asset_id)?;
        if latest.tombstone {
            debug!(asset_type, asset_id, version = latest.version, "latest record is a tombstone");
            return Err(Error::not_found(asset_type, asset_id));
        }
        Ok(latest)
    }
}

fn already_exists(asset_type: &str, asset_id: &str) -> Error {
    Error::AlreadyExists {
        asset_type: asset_type.to_string(),
        asset_id: asset_id.to_string(),
    }
}

/// Drop system-owned keys from user input.
fn strip_reserved(mut data: Fields) -> Fields {
    data.retain(|field, _| {
        let reserved = is_reserved_field(field);
        if reserved {
            debug!(field = %field, "ignoring reserved field in input");
        }
        !reserved
    });
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::schema::{AssetTypeSchema, SchemaRegistry};
    use crate::validate::ValidationError;
    use crate::value::{Value, fields};

    fn service() -> AssetService<MemoryLedger, SchemaRegistry> {
        let schemas = SchemaRegistry::new(AssetTypeSchema::default())
            .with_type("open", AssetTypeSchema::default().with_auto_create_requires_admin(false));
        AssetService::new(MemoryLedger::new(), schemas)
    }

    #[test]
    fn test_import_bypasses_admin_gate() {
        let svc = service();
        let user = Identity::user("alice");
        let data = fields([("name", Value::from("h1"))]);

        assert!(matches!(
            svc.create("host", "h1", data.clone(), &user, false),
            Err(Error::ForbiddenType(_))
        ));
        assert_eq!(svc.create("host", "h1", data.clone(), &user, true).unwrap(), 1);
        // The type is known now, so plain users may add to it
        assert_eq!(svc.create("host", "h2", data, &user, false).unwrap(), 1);
    }

    #[test]
    fn test_schema_can_lift_admin_gate() {
        let svc = service();
        let data = fields([("name", Value::from("x"))]);
        assert_eq!(
            svc.create("open", "x", data, &Identity::user("alice"), false).unwrap(),
            1
        );
    }

    #[test]
    fn test_reserved_input_fields_are_ignored() {
        let svc = service();
        let admin = Identity::admin("root");
        let data = fields([
            ("name", Value::from("h1")),
            ("version", Value::Int(99)),
            ("created_by", Value::from("mallory")),
        ]);
        svc.create("host", "h1", data, &admin, false).unwrap();

        let record = svc.ledger().get_latest("host", "h1").unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.created_by, "root");
        assert_eq!(record.data, fields([("name", Value::from("h1"))]));
    }

    #[test]
    fn test_edit_with_only_reserved_fields_is_empty() {
        let svc = service();
        let admin = Identity::admin("root");
        svc.create("host", "h1", Fields::new(), &admin, false).unwrap();
        let err = svc
            .edit("host", "h1", fields([("version", Value::Int(5))]), &[], &admin)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyEdit));
    }

    #[test]
    fn test_delete_wins_over_overlay() {
        let svc = service();
        let admin = Identity::admin("root");
        svc.create("host", "h1", fields([("a", Value::Int(1))]), &admin, false)
            .unwrap();
        svc.edit(
            "host",
            "h1",
            fields([("a", Value::Int(2)), ("b", Value::Int(3))]),
            &["a".to_string()],
            &admin,
        )
        .unwrap();

        let record = svc.ledger().get_latest("host", "h1").unwrap();
        assert_eq!(record.data, fields([("b", Value::Int(3))]));
    }

    #[test]
    fn test_edit_checks_enforced_on_merged_data() {
        let schemas = SchemaRegistry::new(
            AssetTypeSchema::default()
                .require("name")
                .enforce("status", ["enabled", "disabled"]),
        );
        let svc = AssetService::new(MemoryLedger::new(), schemas);
        let admin = Identity::admin("root");
        svc.create("host", "h1", fields([("name", Value::from("h1"))]), &admin, false)
            .unwrap();

        // Removing a required field is allowed on edit
        svc.edit("host", "h1", fields([("status", Value::from("enabled"))]), &["name".to_string()], &admin)
            .unwrap();

        let err = svc
            .edit("host", "h1", fields([("status", Value::from("gone"))]), &[], &admin)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidValue { ref field, .. }) if field == "status"
        ));
    }
}
