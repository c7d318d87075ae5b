//! Immutable version records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Fields;

/// Audit attribute names. They never appear in diffs.
pub const AUDIT_FIELDS: [&str; 4] = ["created_by", "updated_by", "created_on", "updated_on"];

/// Name under which the version number is exposed in the asset view.
pub const VERSION_FIELD: &str = "version";

/// Returns `true` for names owned by the system rather than the user.
pub fn is_reserved_field(name: &str) -> bool {
    name == VERSION_FIELD || AUDIT_FIELDS.contains(&name)
}

/// One snapshot in an asset's history.
///
/// Records are built by the service and never changed after they are
/// appended. `data` is always the full field set at this version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub asset_type: String,
    pub asset_id: String,
    pub version: u64,
    pub data: Fields,
    pub created_by: String,
    pub created_on: DateTime<Utc>,
    pub updated_by: String,
    pub updated_on: DateTime<Utc>,
    #[serde(default)]
    pub tombstone: bool,
}

impl VersionRecord {
    /// Start a new lifecycle for an asset at `version`.
    ///
    /// This is version 1 for a brand-new id, or the next number after a
    /// tombstone when an id is re-created.
    pub fn genesis(
        asset_type: impl Into<String>,
        asset_id: impl Into<String>,
        version: u64,
        data: Fields,
        user: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            asset_type: asset_type.into(),
            asset_id: asset_id.into(),
            version,
            data,
            created_by: user.to_string(),
            created_on: now,
            updated_by: user.to_string(),
            updated_on: now,
            tombstone: false,
        }
    }

    /// Build the record that follows this one with new data.
    pub fn successor(&self, data: Fields, user: &str, now: DateTime<Utc>) -> Self {
        Self {
            asset_type: self.asset_type.clone(),
            asset_id: self.asset_id.clone(),
            version: self.version + 1,
            data,
            created_by: self.created_by.clone(),
            created_on: self.created_on,
            updated_by: user.to_string(),
            updated_on: now,
            tombstone: false,
        }
    }

    /// Build the tombstone that follows this record, keeping its data.
    pub fn tombstoned(&self, user: &str, now: DateTime<Utc>) -> Self {
        Self {
            tombstone: true,
            ..self.successor(self.data.clone(), user, now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{fields, Value};

    #[test]
    fn test_successor_keeps_creation_audit() {
        let t0 = Utc::now();
        let first = VersionRecord::genesis("host", "h1", 1, Fields::new(), "alice", t0);
        let t1 = t0 + chrono::Duration::seconds(5);
        let second = first.successor(fields([("ip", Value::from("10.0.0.2"))]), "bob", t1);

        assert_eq!(second.version, 2);
        assert_eq!(second.created_by, "alice");
        assert_eq!(second.created_on, t0);
        assert_eq!(second.updated_by, "bob");
        assert_eq!(second.updated_on, t1);
        assert!(!second.tombstone);
    }

    #[test]
    fn test_tombstone_carries_data() {
        let t0 = Utc::now();
        let data = fields([("name", Value::from("h1"))]);
        let first = VersionRecord::genesis("host", "h1", 1, data.clone(), "alice", t0);
        let gone = first.tombstoned("carol", t0);

        assert_eq!(gone.version, 2);
        assert!(gone.tombstone);
        assert_eq!(gone.data, data);
        assert_eq!(gone.updated_by, "carol");
    }

    #[test]
    fn test_reserved_fields() {
        assert!(is_reserved_field("version"));
        assert!(is_reserved_field("updated_on"));
        assert!(!is_reserved_field("name"));
    }
}
