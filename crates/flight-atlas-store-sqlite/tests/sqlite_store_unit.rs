// crates/flight-atlas-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Cache Store Tests
// Description: Unit tests for the SQLite-backed cache store.
// Purpose: Verify dedup atomicity, TTL semantics, and durable transitions.
// Dependencies: flight-atlas-core, flight-atlas-store-sqlite, tempfile
// ============================================================================

//! Unit tests for the SQLite-backed cache store.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]

use std::path::Path;
use std::thread;

use flight_atlas_core::CacheEntry;
use flight_atlas_core::CacheStore;
use flight_atlas_core::Fingerprint;
use flight_atlas_core::JobId;
use flight_atlas_core::JobStatus;
use flight_atlas_core::ResultLocation;
use flight_atlas_core::Timestamp;
use flight_atlas_store_sqlite::SqliteCacheStore;
use flight_atlas_store_sqlite::SqliteStoreConfig;
use tempfile::TempDir;

fn open_store(dir: &Path) -> SqliteCacheStore {
    let config = SqliteStoreConfig {
        path: dir.join("cache.sqlite"),
        busy_timeout_ms: 5_000,
        journal_mode: flight_atlas_store_sqlite::SqliteStoreMode::Wal,
        sync_mode: flight_atlas_store_sqlite::SqliteSyncMode::Full,
    };
    SqliteCacheStore::new(&config).unwrap()
}

fn entry(fingerprint: &Fingerprint, job: &str, created: i64, expiry: i64) -> CacheEntry {
    CacheEntry::new_running(
        fingerprint.clone(),
        JobId::new(job),
        Timestamp::from_unix_seconds(created),
        Timestamp::from_unix_seconds(expiry),
    )
}

#[test]
fn create_then_get_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let fingerprint = Fingerprint::from_hex("ab".repeat(32));
    let created = entry(&fingerprint, "job-1", 1000, 2000);

    let outcome = store.create_if_absent(&created).unwrap();
    assert!(outcome.created);

    let loaded = store.get_entry(&fingerprint, Timestamp::from_unix_seconds(1500)).unwrap();
    assert_eq!(loaded, Some(created));
}

#[test]
fn second_create_returns_the_existing_entry() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let fingerprint = Fingerprint::from_hex("cd".repeat(32));

    let first = entry(&fingerprint, "job-1", 1000, 2000);
    let second = entry(&fingerprint, "job-2", 1001, 2001);
    assert!(store.create_if_absent(&first).unwrap().created);

    let outcome = store.create_if_absent(&second).unwrap();
    assert!(!outcome.created);
    assert_eq!(outcome.current.job_id.as_str(), "job-1");
}

#[test]
fn expired_entries_read_as_absent_and_are_replaced() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let fingerprint = Fingerprint::from_hex("ef".repeat(32));

    let stale = entry(&fingerprint, "job-old", 1000, 1100);
    store.create_if_absent(&stale).unwrap();
    assert_eq!(store.get_entry(&fingerprint, Timestamp::from_unix_seconds(1100)).unwrap(), None);

    let fresh = entry(&fingerprint, "job-new", 1200, 2200);
    let outcome = store.create_if_absent(&fresh).unwrap();
    assert!(outcome.created);
    assert_eq!(outcome.current.job_id.as_str(), "job-new");
}

#[test]
fn update_status_is_forward_only() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let fingerprint = Fingerprint::from_hex("12".repeat(32));
    store.create_if_absent(&entry(&fingerprint, "job-1", 1000, 9000)).unwrap();

    let location = ResultLocation::new("results/job-1.csv");
    assert!(store
        .update_status(&fingerprint, JobStatus::Succeeded, Some(&location), Timestamp::from_unix_seconds(1100))
        .unwrap());

    // Terminal rows are frozen; the write is rejected and the stored
    // location survives.
    let other = ResultLocation::new("results/other.csv");
    assert!(!store
        .update_status(&fingerprint, JobStatus::Failed, Some(&other), Timestamp::from_unix_seconds(1200))
        .unwrap());

    let stored = store
        .get_entry(&fingerprint, Timestamp::from_unix_seconds(1300))
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, JobStatus::Succeeded);
    assert_eq!(stored.result_location, Some(location));
}

#[test]
fn result_location_is_not_set_for_failed_jobs() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let fingerprint = Fingerprint::from_hex("34".repeat(32));
    store.create_if_absent(&entry(&fingerprint, "job-1", 1000, 9000)).unwrap();

    let location = ResultLocation::new("results/job-1.csv");
    assert!(store
        .update_status(&fingerprint, JobStatus::Failed, Some(&location), Timestamp::from_unix_seconds(1100))
        .unwrap());

    let stored = store
        .get_entry(&fingerprint, Timestamp::from_unix_seconds(1200))
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.result_location, None);
}

#[test]
fn purge_expired_removes_only_stale_rows() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let stale = Fingerprint::from_hex("56".repeat(32));
    let live = Fingerprint::from_hex("78".repeat(32));
    store.create_if_absent(&entry(&stale, "job-a", 1000, 1100)).unwrap();
    store.create_if_absent(&entry(&live, "job-b", 1000, 9000)).unwrap();

    let removed = store.purge_expired(Timestamp::from_unix_seconds(1200)).unwrap();

    assert_eq!(removed, 1);
    assert!(store.get_entry(&live, Timestamp::from_unix_seconds(1200)).unwrap().is_some());
}

#[test]
fn entries_survive_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let fingerprint = Fingerprint::from_hex("9a".repeat(32));
    {
        let store = open_store(dir.path());
        store.create_if_absent(&entry(&fingerprint, "job-1", 1000, 9000)).unwrap();
    }
    let reopened = open_store(dir.path());
    let stored = reopened
        .get_entry(&fingerprint, Timestamp::from_unix_seconds(2000))
        .unwrap()
        .unwrap();
    assert_eq!(stored.job_id.as_str(), "job-1");
    assert_eq!(stored.status, JobStatus::Running);
}

#[test]
fn readiness_passes_on_a_healthy_database() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    assert!(store.readiness().is_ok());
}

#[test]
fn concurrent_creates_elect_exactly_one_winner() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let fingerprint = Fingerprint::from_hex("bc".repeat(32));

    let mut handles = Vec::new();
    for worker in 0..8 {
        let store = store.clone();
        let candidate = entry(&fingerprint, &format!("job-{worker}"), 1000, 9000);
        handles.push(thread::spawn(move || store.create_if_absent(&candidate).unwrap()));
    }

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = outcomes.iter().filter(|outcome| outcome.created).count();
    assert_eq!(winners, 1);
    let tracked: Vec<_> = outcomes.iter().map(|o| o.current.job_id.clone()).collect();
    assert!(tracked.windows(2).all(|pair| pair[0] == pair[1]));
}
