use ridelog::core::broker::{self, DbBroker};
use ridelog::core::config::{BackendKind, RideLogConfig};
use ridelog::core::db;
use ridelog::core::error::RideLogError;
use ridelog::core::geometry::{self, Point};
use ridelog::core::locks::KeyedLocks;
use ridelog::core::schemas;
use ridelog::core::storage::{RideStorage, SqliteStorage};
use ridelog::core::store::RideStore;
use ridelog::core::time;
use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn db_and_broker_round_trip_and_audit() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    let broker = DbBroker::new(root, Duration::from_secs(5), true);

    db::initialize_rides_db(&broker).expect("rides init");
    let db_path = db::rides_db_path(root);
    assert!(db_path.exists());

    let conn = db::db_connect(&db_path.to_string_lossy(), Duration::from_secs(1)).expect("connect");
    let mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .expect("pragma journal_mode");
    assert_eq!(mode.to_lowercase(), "wal");
    drop(conn);

    let count: i64 = broker
        .with_conn(&db_path, "rides.count", |conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM rides", [], |row| row.get(0))?)
        })
        .expect("count");
    assert_eq!(count, 0);

    let failed = broker.with_conn(&db_path, "rides.bogus", |conn| {
        conn.execute("SELECT * FROM no_such_table", [])?;
        Ok(())
    });
    assert!(matches!(failed, Err(RideLogError::RusqliteError(_))));

    let audit_path = broker.audit_log_path().expect("audit enabled");
    assert_eq!(audit_path, root.join(schemas::AUDIT_LOG_NAME));
    let events = broker::read_audit_log(audit_path).expect("read audit");
    let ops: Vec<(&str, &str)> = events
        .iter()
        .map(|e| (e.op.as_str(), e.status.as_str()))
        .collect();
    assert_eq!(
        ops,
        vec![
            ("rides.init", "success"),
            ("rides.count", "success"),
            ("rides.bogus", "error")
        ]
    );
    assert!(events.iter().all(|e| e.db_id == schemas::RIDES_DB_NAME));
    assert!(events.iter().all(|e| e.ts.ends_with('Z')));
    assert_ne!(events[0].event_id, events[1].event_id);
}

#[test]
fn broker_without_audit_writes_no_log() {
    let tmp = tempdir().expect("tempdir");
    let broker = DbBroker::new(tmp.path(), Duration::from_secs(5), false);
    db::initialize_rides_db(&broker).expect("rides init");

    assert!(broker.audit_log_path().is_none());
    assert!(!tmp.path().join(schemas::AUDIT_LOG_NAME).exists());
    let events = broker::read_audit_log(&tmp.path().join(schemas::AUDIT_LOG_NAME)).expect("read");
    assert!(events.is_empty());
}

#[test]
fn sqlite_storage_survives_reopen() {
    let tmp = tempdir().expect("tempdir");
    let ride = ridelog::core::ride::Ride::new(
        "u1",
        Point::new(1.25, -2.5),
        Point::new(4.25, 1.5),
        1_510_000_000,
        1_510_000_600,
    )
    .expect("ride");

    {
        let storage =
            SqliteStorage::open(DbBroker::new(tmp.path(), Duration::from_secs(5), false))
                .expect("open");
        storage.insert_bounded(&ride, 5).expect("insert");
    }

    let reopened = SqliteStorage::open(DbBroker::new(tmp.path(), Duration::from_secs(5), false))
        .expect("reopen");
    assert_eq!(reopened.db_path(), db::rides_db_path(tmp.path()));
    assert_eq!(reopened.rides_for("u1").expect("read"), vec![ride]);
}

#[test]
fn audit_failure_does_not_mask_committed_insert() {
    let tmp = tempdir().expect("tempdir");
    let broker = DbBroker::new(tmp.path(), Duration::from_secs(5), true);
    let storage = SqliteStorage::open(broker).expect("open");
    let store = RideStore::new(Arc::new(storage), 5).expect("store");

    // A directory where the audit file should be makes every append fail.
    let audit_path = tmp.path().join(schemas::AUDIT_LOG_NAME);
    fs::remove_file(&audit_path).expect("remove audit log");
    fs::create_dir(&audit_path).expect("block audit log");

    let ride = ridelog::core::ride::Ride::new(
        "u1",
        Point::new(0.0, 0.0),
        Point::new(3.0, 4.0),
        1_510_000_000,
        1_510_000_600,
    )
    .expect("ride");

    assert_eq!(store.insert(&ride).expect("insert reports success"), 0);
    assert_eq!(store.rides_for("u1").expect("read"), vec![ride]);
    assert_eq!(store.all_rides().expect("all").len(), 1);
}

#[test]
fn config_file_and_env_overrides_layer() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join(schemas::CONFIG_FILE_NAME);
    fs::write(
        &path,
        "capacity = 3\nbackend = \"memory\"\nenforce_time_order = true\n",
    )
    .expect("write config");

    let mut config = RideLogConfig::load(tmp.path(), Some(&path)).expect("load");
    let env: HashMap<&str, &str> = HashMap::from([("RIDELOG_CAPACITY", "7")]);
    config
        .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
        .expect("overrides");

    assert_eq!(config.capacity, 7);
    assert_eq!(config.backend, BackendKind::Memory);
    assert!(config.enforce_time_order);
    assert_eq!(config.busy_timeout(), Duration::from_secs(5));
}

#[test]
fn config_rejects_unknown_keys_and_zero_capacity() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("bad.toml");

    fs::write(&path, "capacty = 3\n").expect("write");
    let err = RideLogConfig::load(tmp.path(), Some(&path)).expect_err("typo must fail");
    assert!(matches!(err, RideLogError::ConfigError(_)));
    assert_eq!(err.exit_code(), 2);

    fs::write(&path, "capacity = 0\n").expect("write");
    let err = RideLogConfig::load(tmp.path(), Some(&path)).expect_err("zero must fail");
    assert!(err.to_string().contains("capacity"));

    let missing = tmp.path().join("missing.toml");
    assert!(RideLogConfig::load(tmp.path(), Some(&missing)).is_err());
}

#[test]
fn keyed_locks_serialize_same_key_only() {
    let locks = Arc::new(KeyedLocks::new());
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                locks
                    .with_key("u1", || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(2));
                        inside.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .expect("with_key");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("join");
    }

    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    assert_eq!(locks.len(), 1);
}

#[test]
fn geometry_and_time_helpers() {
    assert_eq!(
        geometry::distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)).expect("distance"),
        5.0
    );
    assert_eq!(geometry::population_variance(&[5.0, 10.0]).expect("var"), 6.25);
    assert!(matches!(
        geometry::population_variance(&[]),
        Err(RideLogError::InsufficientData(_))
    ));

    assert_eq!(
        time::parse_epoch_seconds("start_time", " 1510000000 ").expect("parse"),
        1_510_000_000
    );
    assert!(time::parse_epoch_seconds("start_time", "yesterday").is_err());
    assert!(time::check_epoch_seconds("stop_time", time::MAX_EPOCH_SECS + 1).is_err());
}
