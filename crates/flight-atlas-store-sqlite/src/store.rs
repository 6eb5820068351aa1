// crates/flight-atlas-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Cache Store
// Description: Durable CacheStore backed by SQLite WAL.
// Purpose: Persist one cache entry per fingerprint with atomic dedup.
// Dependencies: flight-atlas-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`CacheStore`] using `SQLite`. One row
//! exists per fingerprint; `create_if_absent` and `update_status` run inside
//! immediate transactions so the read-check-write sequence is atomic for
//! every concurrent caller. Expired rows are treated as absent on read and
//! reclaimed lazily on create or explicitly via [`SqliteCacheStore::purge_expired`].
//! Invariants:
//! - The fingerprint column is the primary key; at most one row per key.
//! - Status never moves backward; terminal rows are frozen until expiry.
//! - `result_location` is written at most once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use flight_atlas_core::CacheEntry;
use flight_atlas_core::CacheStore;
use flight_atlas_core::CacheStoreError;
use flight_atlas_core::CreateOutcome;
use flight_atlas_core::Fingerprint;
use flight_atlas_core::JobId;
use flight_atlas_core::JobStatus;
use flight_atlas_core::ResultLocation;
use flight_atlas_core::Timestamp;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` cache store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding full cache entry payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored row failed decoding.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store configuration or data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for CacheStoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::Db(message)
            | SqliteStoreError::VersionMismatch(message)
            | SqliteStoreError::Invalid(message) => Self::Store(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed cache store with WAL support.
///
/// # Invariants
/// - Connection access is serialized through a mutex; mutations run inside
///   immediate transactions.
#[derive(Clone)]
pub struct SqliteCacheStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCacheStore {
    /// Opens an `SQLite`-backed cache store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Deletes all rows past their TTL and returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the delete fails.
    pub fn purge_expired(&self, now: Timestamp) -> Result<u64, SqliteStoreError> {
        let guard = self.lock()?;
        let deleted = guard
            .execute(
                "DELETE FROM cache_entries WHERE ttl_expiry <= ?1",
                params![now.unix_seconds()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }

    /// Locks the connection, mapping poisoning to a store error.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("sqlite connection mutex poisoned".to_string()))
    }
}

impl CacheStore for SqliteCacheStore {
    fn get_entry(
        &self,
        fingerprint: &Fingerprint,
        now: Timestamp,
    ) -> Result<Option<CacheEntry>, CacheStoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT fingerprint, job_id, status, created_at, last_updated, ttl_expiry, \
                 result_location FROM cache_entries WHERE fingerprint = ?1 AND ttl_expiry > ?2",
                params![fingerprint.as_str(), now.unix_seconds()],
                decode_entry_row,
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        row.transpose().map_err(CacheStoreError::from)
    }

    fn create_if_absent(&self, entry: &CacheEntry) -> Result<CreateOutcome, CacheStoreError> {
        let mut guard = self.lock()?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        // Lazily reclaim an expired row so the fresh entry can take the slot.
        tx.execute(
            "DELETE FROM cache_entries WHERE fingerprint = ?1 AND ttl_expiry <= ?2",
            params![entry.fingerprint.as_str(), entry.created_at.unix_seconds()],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let existing = select_entry(&tx, &entry.fingerprint)?;
        let outcome = match existing {
            Some(current) => CreateOutcome {
                created: false,
                current,
            },
            None => {
                tx.execute(
                    "INSERT INTO cache_entries (fingerprint, job_id, status, created_at, \
                     last_updated, ttl_expiry, result_location) VALUES (?1, ?2, ?3, ?4, ?5, ?6, \
                     ?7)",
                    params![
                        entry.fingerprint.as_str(),
                        entry.job_id.as_str(),
                        entry.status.as_str(),
                        entry.created_at.unix_seconds(),
                        entry.last_updated.unix_seconds(),
                        entry.ttl_expiry.unix_seconds(),
                        entry.result_location.as_ref().map(ResultLocation::as_str),
                    ],
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
                CreateOutcome {
                    created: true,
                    current: entry.clone(),
                }
            }
        };
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(outcome)
    }

    fn update_status(
        &self,
        fingerprint: &Fingerprint,
        status: JobStatus,
        result_location: Option<&ResultLocation>,
        now: Timestamp,
    ) -> Result<bool, CacheStoreError> {
        let mut guard = self.lock()?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let Some(current) = select_entry(&tx, fingerprint)? else {
            tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            return Ok(false);
        };
        if !current.status.admits_transition(status) {
            tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            return Ok(false);
        }
        let location = match (&current.result_location, status) {
            (Some(existing), _) => Some(existing.clone()),
            (None, JobStatus::Succeeded) => result_location.cloned(),
            (None, _) => None,
        };
        tx.execute(
            "UPDATE cache_entries SET status = ?2, last_updated = ?3, result_location = ?4 \
             WHERE fingerprint = ?1",
            params![
                fingerprint.as_str(),
                status.as_str(),
                now.unix_seconds(),
                location.as_ref().map(ResultLocation::as_str),
            ],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(true)
    }

    fn readiness(&self) -> Result<(), CacheStoreError> {
        let guard = self.lock()?;
        guard
            .execute("SELECT 1", [])
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Selects the row for a fingerprint inside an open transaction.
fn select_entry(
    tx: &Transaction<'_>,
    fingerprint: &Fingerprint,
) -> Result<Option<CacheEntry>, SqliteStoreError> {
    tx.query_row(
        "SELECT fingerprint, job_id, status, created_at, last_updated, ttl_expiry, \
         result_location FROM cache_entries WHERE fingerprint = ?1",
        params![fingerprint.as_str()],
        decode_entry_row,
    )
    .optional()
    .map_err(|err| SqliteStoreError::Db(err.to_string()))?
    .transpose()
}

/// Decodes one `cache_entries` row into a [`CacheEntry`].
#[allow(
    clippy::unnecessary_wraps,
    reason = "Signature is fixed by the rusqlite row-mapping callback."
)]
fn decode_entry_row(
    row: &rusqlite::Row<'_>,
) -> Result<Result<CacheEntry, SqliteStoreError>, rusqlite::Error> {
    let fingerprint: String = row.get(0)?;
    let job_id: String = row.get(1)?;
    let status_label: String = row.get(2)?;
    let created_at: i64 = row.get(3)?;
    let last_updated: i64 = row.get(4)?;
    let ttl_expiry: i64 = row.get(5)?;
    let result_location: Option<String> = row.get(6)?;
    let entry = JobStatus::parse(&status_label)
        .ok_or_else(|| {
            SqliteStoreError::Corrupt(format!("unknown stored status: {status_label}"))
        })
        .map(|status| CacheEntry {
            fingerprint: Fingerprint::from_hex(fingerprint),
            job_id: JobId::new(job_id),
            status,
            created_at: Timestamp::from_unix_seconds(created_at),
            last_updated: Timestamp::from_unix_seconds(last_updated),
            ttl_expiry: Timestamp::from_unix_seconds(ttl_expiry),
            result_location: result_location.map(ResultLocation::new),
        });
    Ok(entry)
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Creates the database's parent directory when missing.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    }
    Ok(())
}

/// Opens a connection with the configured flags and pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS cache_entries (
                    fingerprint TEXT PRIMARY KEY,
                    job_id TEXT NOT NULL,
                    status TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    last_updated INTEGER NOT NULL,
                    ttl_expiry INTEGER NOT NULL,
                    result_location TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_cache_entries_ttl
                    ON cache_entries (ttl_expiry);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(found) if found == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "expected schema version {SCHEMA_VERSION}, found {found}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
