//! In-memory ledger backend.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use tracing::{debug, trace};

use super::{Ledger, LedgerError, TypeSummary, VersionRecord, check_append, check_key};

type History = HashMap<(String, String), Vec<VersionRecord>>;

/// Ledger kept entirely in process memory.
///
/// Useful for tests and for embedding the service without a data directory.
/// Histories are dropped with the value.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    history: History,
    types: BTreeSet<String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> Result<T, LedgerError> {
        let guard = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(f(&guard))
    }
}

fn key(asset_type: &str, asset_id: &str) -> (String, String) {
    (asset_type.to_string(), asset_id.to_string())
}

impl Ledger for MemoryLedger {
    fn get_latest(&self, asset_type: &str, asset_id: &str) -> Result<VersionRecord, LedgerError> {
        self.read(|inner| {
            inner
                .history
                .get(&key(asset_type, asset_id))
                .and_then(|records| records.last().cloned())
        })?
        .ok_or_else(|| LedgerError::NotFound {
            asset_type: asset_type.to_string(),
            asset_id: asset_id.to_string(),
        })
    }

    fn get_version(
        &self,
        asset_type: &str,
        asset_id: &str,
        version: u64,
    ) -> Result<VersionRecord, LedgerError> {
        // Versions are gapless from 1, so version v lives at index v - 1
        let index = usize::try_from(version).ok().and_then(|v| v.checked_sub(1));
        self.read(|inner| {
            let records = inner.history.get(&key(asset_type, asset_id))?;
            records.get(index?).cloned()
        })?
        .ok_or_else(|| LedgerError::VersionNotFound {
            asset_type: asset_type.to_string(),
            asset_id: asset_id.to_string(),
            version,
        })
    }

    fn list_recent(
        &self,
        asset_type: &str,
        asset_id: &str,
        limit: usize,
    ) -> Result<Vec<VersionRecord>, LedgerError> {
        self.read(|inner| {
            inner
                .history
                .get(&key(asset_type, asset_id))
                .map(|records| records.iter().rev().take(limit).cloned().collect())
                .unwrap_or_default()
        })
    }

    fn append_if_current(
        &self,
        expected_prior: u64,
        record: VersionRecord,
    ) -> Result<u64, LedgerError> {
        check_key(&record.asset_type, &record.asset_id)?;

        let mut guard = self.inner.write().map_err(|_| LedgerError::Poisoned)?;
        let inner = &mut *guard;
        let records = inner
            .history
            .entry(key(&record.asset_type, &record.asset_id))
            .or_default();
        let actual = records.last().map(|r| r.version).unwrap_or(0);
        check_append(expected_prior, actual, &record)?;

        let version = record.version;
        debug!(
            asset_type = %record.asset_type,
            asset_id = %record.asset_id,
            version,
            tombstone = record.tombstone,
            "appending record"
        );
        if inner.types.insert(record.asset_type.clone()) {
            trace!(asset_type = %record.asset_type, "first record of type");
        }
        records.push(record);
        Ok(version)
    }

    fn type_exists(&self, asset_type: &str) -> Result<bool, LedgerError> {
        self.read(|inner| inner.types.contains(asset_type))
    }

    fn list_types(&self) -> Result<Vec<TypeSummary>, LedgerError> {
        self.read(|inner| {
            inner
                .types
                .iter()
                .map(|name| {
                    let count = inner
                        .history
                        .iter()
                        .filter(|((t, _), records)| {
                            t == name && records.last().is_some_and(|r| !r.tombstone)
                        })
                        .count() as u64;
                    TypeSummary {
                        name: name.clone(),
                        count,
                    }
                })
                .collect()
        })
    }
}
