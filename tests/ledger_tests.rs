//! fjall ledger behavior across reopen and under concurrent appends.

#![cfg(feature = "store")]

use std::sync::Barrier;

use chrono::Utc;
use tempfile::TempDir;

use asset_ledger::prelude::*;

fn admin() -> Identity {
    Identity::admin("root")
}

#[test]
fn test_history_survives_reopen() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("ledger");

    {
        let svc = AssetService::new(FjallLedger::open_or_init(&path)?, SchemaRegistry::default());
        svc.create("host", "h1", fields([("ip", Value::from("10.0.0.1"))]), &admin(), false)?;
        svc.edit("host", "h1", fields([("ip", Value::from("10.0.0.2"))]), &[], &admin())?;
        svc.create("host", "h2", fields([("ip", Value::from("10.0.0.3"))]), &admin(), false)?;
        svc.remove("host", "h2", &admin())?;
    }

    let svc = AssetService::new(FjallLedger::open(&path)?, SchemaRegistry::default());

    let current = svc.get("host", "h1")?;
    assert_eq!(current.version(), 2);
    assert_eq!(current.data.get("ip"), Some(&Value::from("10.0.0.2")));
    assert_eq!(
        svc.get_version("host", "h1", 1)?.data.get("ip"),
        Some(&Value::from("10.0.0.1"))
    );
    assert!(svc.get("host", "h2").unwrap_err().is_not_found());
    assert_eq!(svc.get_versions("host", "h2", None)?.len(), 2);

    // The type marker persisted, so plain users can add to it
    svc.create("host", "h3", Fields::new(), &Identity::user("alice"), false)?;

    let types = svc.list_types()?;
    assert_eq!(
        types,
        vec![TypeSummary {
            name: "host".into(),
            count: 2
        }]
    );

    Ok(())
}

#[test]
fn test_versions_beyond_nine_stay_ordered() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let svc = AssetService::new(
        FjallLedger::init(dir.path().join("ledger"))?,
        SchemaRegistry::default(),
    );
    svc.create("host", "h1", fields([("n", Value::Int(1))]), &admin(), false)?;
    for n in 2..=12 {
        svc.edit("host", "h1", fields([("n", Value::Int(n))]), &[], &admin())?;
    }

    assert_eq!(svc.get("host", "h1")?.version(), 12);
    let recent: Vec<_> = svc
        .get_versions("host", "h1", Some(3))?
        .into_iter()
        .map(|r| r.version)
        .collect();
    assert_eq!(recent, vec![12, 11, 10]);

    Ok(())
}

#[test]
fn test_racing_appends_on_same_prior() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let ledger = FjallLedger::init(dir.path().join("ledger"))?;
    let genesis = VersionRecord::genesis("host", "h1", 1, Fields::new(), "root", Utc::now());
    ledger.append_if_current(0, genesis.clone())?;

    let barrier = Barrier::new(4);
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ledger = &ledger;
                let barrier = &barrier;
                let record = genesis.successor(fields([("writer", Value::Int(i))]), "w", Utc::now());
                scope.spawn(move || {
                    barrier.wait();
                    ledger.append_if_current(1, record)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("append thread panicked"))
            .collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, LedgerError::Conflict { expected: 1, actual: 2, .. }))
    );
    assert_eq!(ledger.list_recent("host", "h1", 10)?.len(), 2);

    Ok(())
}

#[test]
fn test_invalid_keys_are_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let svc = AssetService::new(
        FjallLedger::init(dir.path().join("ledger"))?,
        SchemaRegistry::default(),
    );

    let err = svc
        .create("host", "bad\0id", Fields::new(), &admin(), false)
        .unwrap_err();
    assert!(matches!(err, Error::Ledger(LedgerError::InvalidKey(_))));

    let err = svc.create("", "h1", Fields::new(), &admin(), false).unwrap_err();
    assert!(matches!(err, Error::Ledger(LedgerError::InvalidKey(_))));

    Ok(())
}
