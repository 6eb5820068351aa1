// crates/flight-atlas-core/src/interfaces/mod.rs
// ============================================================================
// Module: Flight Atlas Interfaces
// Description: Backend-agnostic interfaces for cache, engine, and results.
// Purpose: Define the contract surfaces consumed by the orchestrator.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Flight Atlas integrates with the cache store, the
//! analytical query engine, and the blob store without embedding
//! backend-specific details. Implementations must fail closed: a store or
//! engine error is surfaced, never silently bypassed, because bypassing the
//! store would break the job deduplication invariant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use thiserror::Error;

use crate::core::entry::CacheEntry;
use crate::core::entry::JobStatus;
use crate::core::identifiers::Fingerprint;
use crate::core::identifiers::JobId;
use crate::core::identifiers::ResultLocation;
use crate::core::query::CanonicalQuery;
use crate::core::rows::ResultRow;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Cache Store
// ============================================================================

/// Cache store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum CacheStoreError {
    /// Store I/O error.
    #[error("cache store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails decoding.
    #[error("cache store corruption: {0}")]
    Corrupt(String),
    /// Store reported an error.
    #[error("cache store error: {0}")]
    Store(String),
}

/// Outcome of an atomic create-if-absent call.
///
/// # Invariants
/// - `current` is the entry now present under the fingerprint, whether or not
///   this call created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    /// True when this call created the entry.
    pub created: bool,
    /// The entry tracked under the fingerprint after the call.
    pub current: CacheEntry,
}

/// Persistent, TTL-bearing cache of one entry per fingerprint.
///
/// `create_if_absent` is the dedup primitive and must be atomic at the store
/// level; a plain read-then-write would let two concurrent first-time
/// requests both submit backend jobs.
pub trait CacheStore: Send + Sync {
    /// Loads the entry for a fingerprint, treating expired entries as absent.
    ///
    /// # Errors
    ///
    /// Returns [`CacheStoreError`] when loading fails.
    fn get_entry(
        &self,
        fingerprint: &Fingerprint,
        now: Timestamp,
    ) -> Result<Option<CacheEntry>, CacheStoreError>;

    /// Atomically creates the entry unless one already exists.
    ///
    /// An existing entry that is already expired relative to
    /// `entry.created_at` counts as absent and is replaced. When an entry
    /// survives, it is returned with `created = false` and the caller's
    /// submission bookkeeping must be discarded.
    ///
    /// # Errors
    ///
    /// Returns [`CacheStoreError`] when the store operation fails.
    fn create_if_absent(&self, entry: &CacheEntry) -> Result<CreateOutcome, CacheStoreError>;

    /// Conditionally advances an entry's status.
    ///
    /// The update applies only when the stored status admits the transition
    /// (see [`JobStatus::admits_transition`]); terminal entries are never
    /// modified. An existing `result_location` is never overwritten. Returns
    /// true when the update was applied.
    ///
    /// # Errors
    ///
    /// Returns [`CacheStoreError`] when the store operation fails.
    fn update_status(
        &self,
        fingerprint: &Fingerprint,
        status: JobStatus,
        result_location: Option<&ResultLocation>,
        now: Timestamp,
    ) -> Result<bool, CacheStoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`CacheStoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), CacheStoreError> {
        Ok(())
    }
}

/// Shared, clonable handle over a cache store implementation.
#[derive(Clone)]
pub struct SharedCacheStore {
    /// The wrapped store implementation.
    inner: Arc<dyn CacheStore>,
}

impl SharedCacheStore {
    /// Wraps a store implementation in a shared handle.
    #[must_use]
    pub fn from_store(store: impl CacheStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }
}

impl CacheStore for SharedCacheStore {
    fn get_entry(
        &self,
        fingerprint: &Fingerprint,
        now: Timestamp,
    ) -> Result<Option<CacheEntry>, CacheStoreError> {
        self.inner.get_entry(fingerprint, now)
    }

    fn create_if_absent(&self, entry: &CacheEntry) -> Result<CreateOutcome, CacheStoreError> {
        self.inner.create_if_absent(entry)
    }

    fn update_status(
        &self,
        fingerprint: &Fingerprint,
        status: JobStatus,
        result_location: Option<&ResultLocation>,
        now: Timestamp,
    ) -> Result<bool, CacheStoreError> {
        self.inner.update_status(fingerprint, status, result_location, now)
    }

    fn readiness(&self) -> Result<(), CacheStoreError> {
        self.inner.readiness()
    }
}

// ============================================================================
// SECTION: In-Memory Cache Store
// ============================================================================

/// In-memory cache store for tests and single-process deployments.
///
/// # Invariants
/// - All operations take the map lock, so `create_if_absent` is atomic with
///   respect to concurrent callers.
#[derive(Default)]
pub struct InMemoryCacheStore {
    /// Entries keyed by fingerprint digest.
    entries: Mutex<BTreeMap<Fingerprint, CacheEntry>>,
}

impl InMemoryCacheStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the entry map, mapping poisoning to a store error.
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<Fingerprint, CacheEntry>>, CacheStoreError> {
        self.entries.lock().map_err(|_| CacheStoreError::Store("entry map lock poisoned".to_string()))
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get_entry(
        &self,
        fingerprint: &Fingerprint,
        now: Timestamp,
    ) -> Result<Option<CacheEntry>, CacheStoreError> {
        let entries = self.lock()?;
        Ok(entries.get(fingerprint).filter(|entry| !entry.is_expired(now)).cloned())
    }

    fn create_if_absent(&self, entry: &CacheEntry) -> Result<CreateOutcome, CacheStoreError> {
        let mut entries = self.lock()?;
        if let Some(existing) = entries.get(&entry.fingerprint)
            && !existing.is_expired(entry.created_at)
        {
            return Ok(CreateOutcome {
                created: false,
                current: existing.clone(),
            });
        }
        entries.insert(entry.fingerprint.clone(), entry.clone());
        Ok(CreateOutcome {
            created: true,
            current: entry.clone(),
        })
    }

    fn update_status(
        &self,
        fingerprint: &Fingerprint,
        status: JobStatus,
        result_location: Option<&ResultLocation>,
        now: Timestamp,
    ) -> Result<bool, CacheStoreError> {
        let mut entries = self.lock()?;
        let Some(entry) = entries.get_mut(fingerprint) else {
            return Ok(false);
        };
        if !entry.status.admits_transition(status) {
            return Ok(false);
        }
        entry.status = status;
        entry.last_updated = now;
        if status == JobStatus::Succeeded && entry.result_location.is_none() {
            entry.result_location = result_location.cloned();
        }
        Ok(true)
    }
}

// ============================================================================
// SECTION: Query Engine
// ============================================================================

/// Query engine errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling; submit and poll failures
///   are distinguished for status mapping.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine rejected or failed the submission call.
    #[error("engine submit error: {0}")]
    Submit(String),
    /// Engine failed the poll call.
    #[error("engine poll error: {0}")]
    Poll(String),
}

/// Poll response for an asynchronous engine job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPoll {
    /// Current job state reported by the engine.
    pub state: JobStatus,
    /// Result location, present once the job has succeeded.
    pub result_location: Option<ResultLocation>,
}

/// Asynchronous analytical query engine.
///
/// Both operations are single bounded calls; the core never retries them
/// inline and never blocks waiting for a job to finish.
pub trait QueryEngine: Send + Sync {
    /// Submits a canonical query and returns the engine job identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Submit`] when the engine is unreachable or
    /// rejects the query.
    fn submit(&self, query: &CanonicalQuery) -> Result<JobId, EngineError>;

    /// Polls a job for its current state in a single round trip.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Poll`] when the engine is unreachable or the
    /// job is unknown.
    fn poll(&self, job_id: &JobId) -> Result<JobPoll, EngineError>;
}

// ============================================================================
// SECTION: Result Fetcher
// ============================================================================

/// Result fetch errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Result object does not exist at the location.
    #[error("result object missing: {0}")]
    Missing(String),
    /// Result object exists but cannot be decoded.
    #[error("result object malformed: {0}")]
    Malformed(String),
    /// Transport failure while fetching the object.
    #[error("result fetch io error: {0}")]
    Io(String),
}

/// Retrieves materialized tabular rows for a completed job.
pub trait ResultFetcher: Send + Sync {
    /// Loads the delimited result object into ordered rows.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the object is missing or malformed.
    fn fetch(&self, location: &ResultLocation) -> Result<Vec<ResultRow>, FetchError>;
}
