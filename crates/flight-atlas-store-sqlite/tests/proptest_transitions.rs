// crates/flight-atlas-store-sqlite/tests/proptest_transitions.rs
// ============================================================================
// Module: SQLite Transition Property Tests
// Description: Property tests for forward-only updates in the durable store.
// Purpose: Verify the SQLite store enforces the same transition rule as core.
// Dependencies: flight-atlas-core, flight-atlas-store-sqlite, proptest, tempfile
// ============================================================================

//! Property tests for forward-only updates in the durable store.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]

use flight_atlas_core::CacheEntry;
use flight_atlas_core::CacheStore;
use flight_atlas_core::Fingerprint;
use flight_atlas_core::JobId;
use flight_atlas_core::JobStatus;
use flight_atlas_core::ResultLocation;
use flight_atlas_core::Timestamp;
use flight_atlas_store_sqlite::SqliteCacheStore;
use flight_atlas_store_sqlite::SqliteStoreConfig;
use flight_atlas_store_sqlite::SqliteStoreMode;
use flight_atlas_store_sqlite::SqliteSyncMode;
use proptest::collection::vec;
use proptest::prelude::Just;
use proptest::prelude::Strategy;
use proptest::prelude::prop_oneof;
use proptest::prelude::proptest;
use tempfile::TempDir;

/// Strategy over every job status.
fn any_status() -> impl Strategy<Value = JobStatus> {
    prop_oneof![
        Just(JobStatus::Queued),
        Just(JobStatus::Running),
        Just(JobStatus::Succeeded),
        Just(JobStatus::Failed),
        Just(JobStatus::Cancelled),
    ]
}

/// Forward-progress rank mirrored from the transition rule.
fn rank(status: JobStatus) -> u8 {
    match status {
        JobStatus::Queued => 0,
        JobStatus::Running => 1,
        JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled => 2,
    }
}

fn open_store(dir: &TempDir) -> SqliteCacheStore {
    let config = SqliteStoreConfig {
        path: dir.path().join("cache.sqlite"),
        busy_timeout_ms: 5_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    };
    SqliteCacheStore::new(&config).unwrap()
}

proptest! {
    #[test]
    fn durable_status_updates_never_move_backward(updates in vec(any_status(), 1..10)) {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let fingerprint = Fingerprint::from_hex("ab".repeat(32));
        let entry = CacheEntry::new_running(
            fingerprint.clone(),
            JobId::new("job-prop"),
            Timestamp::from_unix_seconds(0),
            Timestamp::from_unix_seconds(1_000_000),
        );
        store.create_if_absent(&entry).unwrap();

        let mut terminal_seen = None;
        for (step, status) in updates.into_iter().enumerate() {
            let now = Timestamp::from_unix_seconds((step as i64) + 1);
            let before = store.get_entry(&fingerprint, now).unwrap().unwrap();
            let location = ResultLocation::new(format!("results/{step}.csv"));
            let applied = store
                .update_status(&fingerprint, status, Some(&location), now)
                .unwrap();
            let after = store.get_entry(&fingerprint, now).unwrap().unwrap();

            assert!(rank(after.status) >= rank(before.status));
            if let Some(frozen) = terminal_seen {
                assert!(!applied);
                assert_eq!(after.status, frozen);
            }
            if after.status.is_terminal() && terminal_seen.is_none() {
                terminal_seen = Some(after.status);
            }
        }
    }
}
