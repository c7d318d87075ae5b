//! Persistent ledger backed by fjall.
//!
//! Records live in the `versions` keyspace under
//! `asset_type \0 asset_id \0 version`, with the version zero-padded to 20
//! digits so that a prefix scan walks an asset's history in order. Each
//! value is a JSON-encoded [`VersionRecord`] prefixed with its CRC32.
//!
//! The `_meta` keyspace holds the store version and one `types/<name>`
//! marker per asset type ever written.

use std::path::Path;
use std::sync::Mutex;

use fjall::{Keyspace, KeyspaceCreateOptions, PersistMode};
use tracing::{debug, error, info, trace, warn};

use super::{Ledger, LedgerError, TypeSummary, VersionRecord, check_append, check_key};

const META_TYPES_PREFIX: &str = "types/";
const META_CONFIG_KEY: &str = "config";

/// Current on-disk layout version.
/// Opening a store written with a different layout is refused.
const STORE_VERSION: u32 = 1;

/// Ledger persisted in a fjall database directory.
///
/// Appends are serialized by a write lock held only for the duration of
/// the check-and-insert; reads never take it.
pub struct FjallLedger {
    db: fjall::Database,
    meta: Keyspace,
    versions: Keyspace,
    write_lock: Mutex<()>,
}

impl FjallLedger {
    /// Open an existing ledger at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening ledger");

        if !path.exists() {
            error!(path = %path.display(), "ledger path does not exist");
            return Err(LedgerError::NotInitialized(path.display().to_string()));
        }

        let db = fjall::Database::builder(path).open()?;
        let meta = db.keyspace("_meta", KeyspaceCreateOptions::default)?;

        let Some(config) = meta.get(META_CONFIG_KEY)? else {
            error!(path = %path.display(), "ledger not initialized - no config found");
            return Err(LedgerError::NotInitialized(path.display().to_string()));
        };
        let version = u32::from_le_bytes(
            config
                .as_ref()
                .try_into()
                .map_err(|_| LedgerError::InvalidFormat("Invalid config format".to_string()))?,
        );
        if version != STORE_VERSION {
            error!(
                stored_version = version,
                expected_version = STORE_VERSION,
                "ledger layout version mismatch"
            );
            return Err(LedgerError::InvalidFormat(format!(
                "Store version mismatch: expected {}, got {}",
                STORE_VERSION, version
            )));
        }

        let versions = db.keyspace("versions", KeyspaceCreateOptions::default)?;
        info!(path = %path.display(), "ledger opened");
        Ok(Self {
            db,
            meta,
            versions,
            write_lock: Mutex::new(()),
        })
    }

    /// Initialize a new ledger at the given path.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "initializing ledger");

        let db = fjall::Database::builder(path).open()?;
        let meta = db.keyspace("_meta", KeyspaceCreateOptions::default)?;
        let versions = db.keyspace("versions", KeyspaceCreateOptions::default)?;

        meta.insert(META_CONFIG_KEY, STORE_VERSION.to_le_bytes())?;
        db.persist(PersistMode::SyncAll)?;

        info!(path = %path.display(), version = STORE_VERSION, "ledger initialized");
        Ok(Self {
            db,
            meta,
            versions,
            write_lock: Mutex::new(()),
        })
    }

    /// Open the ledger if the directory exists, otherwise initialize it.
    pub fn open_or_init(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        if path.exists() {
            Self::open(path)
        } else {
            Self::init(path)
        }
    }

    /// Keys of the newest `limit` records of one asset, newest first.
    fn recent_keys(
        &self,
        asset_type: &str,
        asset_id: &str,
        limit: usize,
    ) -> Result<Vec<Vec<u8>>, LedgerError> {
        let prefix = asset_prefix(asset_type, asset_id);
        let mut keys = Vec::new();
        for kv in self.versions.prefix(&prefix).rev().take(limit) {
            let key = kv.key().map_err(|e| LedgerError::Corrupt(e.to_string()))?;
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    /// Key of the newest record of one asset.
    fn latest_key(&self, asset_type: &str, asset_id: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.recent_keys(asset_type, asset_id, 1)?.pop())
    }

    fn load(&self, key: &[u8]) -> Result<Option<VersionRecord>, LedgerError> {
        match self.versions.get(key)? {
            Some(bytes) => decode_record(bytes.as_ref()).map(Some),
            None => Ok(None),
        }
    }

    fn latest_version(&self, asset_type: &str, asset_id: &str) -> Result<u64, LedgerError> {
        match self.latest_key(asset_type, asset_id)? {
            Some(key) => version_from_key(&key),
            None => Ok(0),
        }
    }
}

impl Ledger for FjallLedger {
    fn get_latest(&self, asset_type: &str, asset_id: &str) -> Result<VersionRecord, LedgerError> {
        trace!(asset_type, asset_id, "loading latest record");
        let not_found = || LedgerError::NotFound {
            asset_type: asset_type.to_string(),
            asset_id: asset_id.to_string(),
        };
        let key = self.latest_key(asset_type, asset_id)?.ok_or_else(not_found)?;
        self.load(&key)?.ok_or_else(not_found)
    }

    fn get_version(
        &self,
        asset_type: &str,
        asset_id: &str,
        version: u64,
    ) -> Result<VersionRecord, LedgerError> {
        trace!(asset_type, asset_id, version, "loading record");
        self.load(&record_key(asset_type, asset_id, version))?
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
        let keys = self.recent_keys(asset_type, asset_id, limit)?;
        let mut records = Vec::with_capacity(keys.len());
        for key in &keys {
            match self.load(key)? {
                Some(record) => records.push(record),
                None => warn!(asset_type, asset_id, "record vanished during listing"),
            }
        }
        debug!(asset_type, asset_id, count = records.len(), "listed versions");
        Ok(records)
    }

    fn append_if_current(
        &self,
        expected_prior: u64,
        record: VersionRecord,
    ) -> Result<u64, LedgerError> {
        check_key(&record.asset_type, &record.asset_id)?;
        let encoded = encode_record(&record)?;

        let _guard = self.write_lock.lock().map_err(|_| LedgerError::Poisoned)?;
        let actual = self.latest_version(&record.asset_type, &record.asset_id)?;
        if let Err(e) = check_append(expected_prior, actual, &record) {
            debug!(
                asset_type = %record.asset_type,
                asset_id = %record.asset_id,
                expected_prior,
                actual,
                "append rejected"
            );
            return Err(e);
        }

        // Type marker and record land together or not at all
        let mut batch = self.db.batch();
        let type_key = format!("{}{}", META_TYPES_PREFIX, record.asset_type);
        if self.meta.get(&type_key)?.is_none() {
            batch.insert(&self.meta, type_key, record.created_on.to_rfc3339());
            info!(asset_type = %record.asset_type, "new asset type");
        }
        let key = record_key(&record.asset_type, &record.asset_id, record.version);
        batch.insert(&self.versions, key, encoded);
        batch.commit()?;
        self.db.persist(PersistMode::SyncAll)?;

        debug!(
            asset_type = %record.asset_type,
            asset_id = %record.asset_id,
            version = record.version,
            tombstone = record.tombstone,
            "record appended"
        );
        Ok(record.version)
    }

    fn type_exists(&self, asset_type: &str) -> Result<bool, LedgerError> {
        let type_key = format!("{}{}", META_TYPES_PREFIX, asset_type);
        Ok(self.meta.get(&type_key)?.is_some())
    }

    fn list_types(&self) -> Result<Vec<TypeSummary>, LedgerError> {
        let mut names = Vec::new();
        for kv in self.meta.prefix(META_TYPES_PREFIX) {
            let key = kv.key().map_err(|e| LedgerError::Corrupt(e.to_string()))?;
            let key_str = String::from_utf8_lossy(&key);
            if let Some(name) = key_str.strip_prefix(META_TYPES_PREFIX) {
                names.push(name.to_string());
            }
        }
        names.sort();

        let mut summaries = Vec::with_capacity(names.len());
        for name in names {
            // Keys are ordered, so the last key seen for an id is its latest
            let mut latest: Vec<(String, Vec<u8>)> = Vec::new();
            for kv in self.versions.prefix(format!("{}\0", name)) {
                let key = kv.key().map_err(|e| LedgerError::Corrupt(e.to_string()))?;
                let (_, id, _) = split_key(&key)?;
                match latest.last_mut() {
                    Some((last_id, last_key)) if *last_id == id => *last_key = key.to_vec(),
                    _ => latest.push((id, key.to_vec())),
                }
            }

            let mut count = 0;
            for (_, key) in &latest {
                if self.load(key)?.is_some_and(|r| !r.tombstone) {
                    count += 1;
                }
            }
            summaries.push(TypeSummary { name, count });
        }
        Ok(summaries)
    }
}

fn asset_prefix(asset_type: &str, asset_id: &str) -> String {
    format!("{}\0{}\0", asset_type, asset_id)
}

fn record_key(asset_type: &str, asset_id: &str, version: u64) -> Vec<u8> {
    format!("{}{:020}", asset_prefix(asset_type, asset_id), version).into_bytes()
}

fn split_key(key: &[u8]) -> Result<(String, String, u64), LedgerError> {
    let text = std::str::from_utf8(key).map_err(|e| LedgerError::Corrupt(e.to_string()))?;
    let mut parts = text.splitn(3, '\0');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(asset_type), Some(asset_id), Some(version)) => {
            let version = version
                .parse()
                .map_err(|_| LedgerError::Corrupt(format!("bad version in key '{}'", text)))?;
            Ok((asset_type.to_string(), asset_id.to_string(), version))
        }
        _ => Err(LedgerError::Corrupt(format!("malformed key '{}'", text))),
    }
}

fn version_from_key(key: &[u8]) -> Result<u64, LedgerError> {
    split_key(key).map(|(_, _, version)| version)
}

fn encode_record(record: &VersionRecord) -> Result<Vec<u8>, LedgerError> {
    let json = serde_json::to_vec(record)?;
    let mut out = Vec::with_capacity(json.len() + 4);
    out.extend_from_slice(&crc32fast::hash(&json).to_le_bytes());
    out.extend_from_slice(&json);
    Ok(out)
}

fn decode_record(bytes: &[u8]) -> Result<VersionRecord, LedgerError> {
    let (checksum, json) = bytes
        .split_at_checked(4)
        .ok_or_else(|| LedgerError::Corrupt("record shorter than checksum".to_string()))?;
    let stored = u32::from_le_bytes(
        checksum
            .try_into()
            .map_err(|_| LedgerError::Corrupt("bad checksum width".to_string()))?,
    );
    let actual = crc32fast::hash(json);
    if stored != actual {
        return Err(LedgerError::Corrupt(format!(
            "checksum mismatch: stored {:08x}, computed {:08x}",
            stored, actual
        )));
    }
    Ok(serde_json::from_slice(json)?)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::value::{Fields, Value, fields};

    #[test]
    fn test_key_layout_sorts_by_version() {
        let k9 = record_key("host", "h1", 9);
        let k10 = record_key("host", "h1", 10);
        assert!(k9 < k10);
        assert_eq!(split_key(&k10).unwrap(), ("host".into(), "h1".into(), 10));
    }

    #[test]
    fn test_codec_detects_corruption() {
        let record = VersionRecord::genesis(
            "host",
            "h1",
            1,
            fields([("name", Value::from("h1"))]),
            "alice",
            Utc::now(),
        );
        let mut bytes = encode_record(&record).unwrap();
        assert_eq!(decode_record(&bytes).unwrap(), record);

        if let Some(last) = bytes.last_mut() {
            *last ^= 0xff;
        }
        assert!(matches!(decode_record(&bytes), Err(LedgerError::Corrupt(_))));
        assert!(matches!(decode_record(&[1, 2]), Err(LedgerError::Corrupt(_))));
    }

    #[test]
    fn test_open_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        assert!(matches!(
            FjallLedger::open(&path),
            Err(LedgerError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_append_conflict_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger");
        {
            let ledger = FjallLedger::init(&path).unwrap();
            let first = VersionRecord::genesis("host", "h1", 1, Fields::new(), "alice", Utc::now());
            ledger.append_if_current(0, first.clone()).unwrap();
            assert!(matches!(
                ledger.append_if_current(0, first.clone()),
                Err(LedgerError::Conflict { .. })
            ));
            let second = first.successor(fields([("ip", Value::from("10.0.0.2"))]), "bob", Utc::now());
            assert_eq!(ledger.append_if_current(1, second).unwrap(), 2);
        }

        let ledger = FjallLedger::open(&path).unwrap();
        assert_eq!(ledger.get_latest("host", "h1").unwrap().version, 2);
        assert!(ledger.type_exists("host").unwrap());
        assert_eq!(ledger.list_types().unwrap().len(), 1);
    }

    #[test]
    fn test_latest_and_recent_scan_from_the_end() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FjallLedger::init(dir.path().join("ledger")).unwrap();

        let mut record = VersionRecord::genesis("host", "h1", 1, Fields::new(), "alice", Utc::now());
        ledger.append_if_current(0, record.clone()).unwrap();
        for n in 2..=15 {
            record = record.successor(fields([("n", Value::Int(n))]), "alice", Utc::now());
            ledger.append_if_current(record.version - 1, record.clone()).unwrap();
        }
        // An id sharing a prefix must not leak into h1's history
        let other = VersionRecord::genesis("host", "h10", 1, Fields::new(), "bob", Utc::now());
        ledger.append_if_current(0, other).unwrap();

        assert_eq!(ledger.get_latest("host", "h1").unwrap().version, 15);
        assert_eq!(ledger.latest_version("host", "h10").unwrap(), 1);
        assert_eq!(ledger.latest_version("host", "h2").unwrap(), 0);

        let recent: Vec<_> = ledger
            .list_recent("host", "h1", 3)
            .unwrap()
            .into_iter()
            .map(|r| r.version)
            .collect();
        assert_eq!(recent, vec![15, 14, 13]);
        assert_eq!(ledger.list_recent("host", "h1", 100).unwrap().len(), 15);
    }

    #[test]
    fn test_rejected_append_leaves_no_type_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger");
        {
            let ledger = FjallLedger::init(&path).unwrap();
            let skipped = VersionRecord::genesis("rack", "r1", 2, Fields::new(), "alice", Utc::now());
            assert!(matches!(
                ledger.append_if_current(0, skipped),
                Err(LedgerError::OutOfSequence { .. })
            ));
            assert!(!ledger.type_exists("rack").unwrap());

            let first = VersionRecord::genesis("rack", "r1", 1, Fields::new(), "alice", Utc::now());
            ledger.append_if_current(0, first).unwrap();
        }

        let ledger = FjallLedger::open(&path).unwrap();
        assert!(ledger.type_exists("rack").unwrap());
        assert_eq!(ledger.get_latest("rack", "r1").unwrap().version, 1);
    }
}
