//! Field-level diffs between version records.

use serde::Serialize;

use crate::ledger::{VersionRecord, is_reserved_field};
use crate::value::Value;

/// How a field changed between two versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// A single field change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// Changes from one version of an asset to another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionDiff {
    pub from_version: u64,
    pub to_version: u64,
    /// Whether the newer record is a tombstone.
    pub tombstone: bool,
    pub changes: Vec<FieldChange>,
}

impl VersionDiff {
    /// Look up the change recorded for `field`, if any.
    pub fn change(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field == field)
    }
}

/// Diff two records. `from` is treated as the older side.
///
/// Changes come out in field-name order. Audit and version fields are
/// skipped.
pub fn diff_pair(from: &VersionRecord, to: &VersionRecord) -> VersionDiff {
    let mut changes = Vec::new();

    for (field, old) in &from.data {
        if is_reserved_field(field) {
            continue;
        }
        match to.data.get(field) {
            None => changes.push(FieldChange {
                field: field.clone(),
                kind: ChangeKind::Removed,
                old_value: Some(old.clone()),
                new_value: None,
            }),
            Some(new) if new != old => changes.push(FieldChange {
                field: field.clone(),
                kind: ChangeKind::Modified,
                old_value: Some(old.clone()),
                new_value: Some(new.clone()),
            }),
            Some(_) => {}
        }
    }
    for (field, new) in &to.data {
        if is_reserved_field(field) || from.data.contains_key(field) {
            continue;
        }
        changes.push(FieldChange {
            field: field.clone(),
            kind: ChangeKind::Added,
            old_value: None,
            new_value: Some(new.clone()),
        });
    }
    changes.sort_by(|a, b| a.field.cmp(&b.field));

    VersionDiff {
        from_version: from.version,
        to_version: to.version,
        tombstone: to.tombstone,
        changes,
    }
}

/// Diff each consecutive pair of an oldest-first sequence.
///
/// Fewer than two records yield no diffs.
pub fn diff_sequence(records: &[VersionRecord]) -> Vec<VersionDiff> {
    records
        .windows(2)
        .filter_map(|pair| match pair {
            [from, to] => Some(diff_pair(from, to)),
            _ => None,
        })
        .collect()
}
