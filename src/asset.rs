//! Current-state view of an asset.

use serde::Serialize;

use crate::ledger::{VERSION_FIELD, VersionRecord};
use crate::value::{Fields, Value};

/// An asset as callers see it: user fields merged with system fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub id: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub data: Fields,
    /// Set when this version records the asset's deletion.
    pub tombstone: bool,
}

impl Asset {
    /// Build the view of a record, exposing its version and audit attributes
    /// as data fields.
    pub fn from_record(record: VersionRecord) -> Self {
        let mut data = record.data;
        data.insert(VERSION_FIELD.to_string(), Value::Int(version_as_i64(record.version)));
        data.insert("created_by".to_string(), Value::String(record.created_by));
        data.insert("created_on".to_string(), Value::String(record.created_on.to_rfc3339()));
        data.insert("updated_by".to_string(), Value::String(record.updated_by));
        data.insert("updated_on".to_string(), Value::String(record.updated_on.to_rfc3339()));

        Self {
            id: record.asset_id,
            asset_type: record.asset_type,
            data,
            tombstone: record.tombstone,
        }
    }

    /// The version carried in `data`, or `-1` when it is absent or not a
    /// number.
    ///
    /// Never fails; `-1` marks an unversioned (new) asset.
    pub fn version(&self) -> i64 {
        match self.data.get(VERSION_FIELD) {
            Some(Value::Int(v)) if *v > 0 => *v,
            Some(Value::Float(f)) if f.fract() == 0.0 && *f >= 1.0 && *f <= i64::MAX as f64 => {
                *f as i64
            }
            Some(Value::String(s)) => s.trim().parse().ok().filter(|v| *v > 0).unwrap_or(-1),
            _ => -1,
        }
    }
}

fn version_as_i64(version: u64) -> i64 {
    i64::try_from(version).unwrap_or(i64::MAX)
}
