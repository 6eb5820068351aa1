// crates/flight-atlas-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Flight Atlas Orchestrator
// Description: Per-request state machine over cache, engine, and fetcher.
// Purpose: Deduplicate backend jobs and materialize cached query results.
// Dependencies: crate::core, crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! The orchestrator drives one request through the fingerprint state machine:
//! ABSENT, in flight (QUEUED/RUNNING), then SUCCEEDED, FAILED, or CANCELLED.
//! It always answers within one request cycle, returning either a processing
//! acknowledgement or the final payload; clients poll by repeating the
//! request.
//! Invariants:
//! - A cache miss submits exactly one job from this caller; when a concurrent
//!   request wins the `create_if_absent` race, the winner's entry is served
//!   and the extra backend job is abandoned (accepted relaxation, the engine
//!   side performs no strict dedup).
//! - FAILED and CANCELLED entries are terminal until TTL expiry; the
//!   orchestrator never resubmits them.
//! - No engine, store, or fetch call is retried inline; failures surface to
//!   the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::entry::CacheEntry;
use crate::core::entry::JobStatus;
use crate::core::identifiers::JobId;
use crate::core::identifiers::ResultLocation;
use crate::core::payload::ResponsePayload;
use crate::core::query::CanonicalQuery;
use crate::core::request::RouteRequest;
use crate::core::time::Timestamp;
use crate::interfaces::CacheStore;
use crate::interfaces::CacheStoreError;
use crate::interfaces::EngineError;
use crate::interfaces::FetchError;
use crate::interfaces::QueryEngine;
use crate::interfaces::ResultFetcher;
use crate::interfaces::SharedCacheStore;
use crate::runtime::transform::RowSkip;
use crate::runtime::transform::transform;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default entry TTL: seven days, matching the recommended store default.
pub const DEFAULT_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Processing phase reported to a polling client.
///
/// # Invariants
/// - Labels are stable response-body values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingPhase {
    /// This request submitted the backend job.
    Started,
    /// The job was already in flight.
    Processing,
}

impl ProcessingPhase {
    /// Returns the stable response-body label for the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Processing => "processing",
        }
    }
}

/// Outcome of one orchestrated request cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResponse {
    /// The result is materialized and transformed.
    Ready {
        /// Endpoint-specific response payload.
        payload: ResponsePayload,
        /// Rows skipped during transformation.
        skipped: Vec<RowSkip>,
    },
    /// The backend job is still in flight; poll again.
    Processing {
        /// Whether this request started the job or found it in flight.
        phase: ProcessingPhase,
        /// The tracked engine job identifier.
        job_id: JobId,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Orchestrator errors surfaced to the transport layer.
///
/// # Invariants
/// - Variants are stable for programmatic handling and status mapping.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Cache store failure; never bypassed, as that would break dedup.
    #[error(transparent)]
    Store(#[from] CacheStoreError),
    /// Engine submit or poll failure.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Result object fetch failure.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The tracked backend job ended without a result.
    #[error("backend job {job_id} ended as {status}", status = .status.as_str())]
    JobFailed {
        /// The tracked job identifier.
        job_id: JobId,
        /// The terminal status reported for the job.
        status: JobStatus,
    },
    /// A succeeded job has no recorded result location.
    #[error("succeeded job {0} has no result location")]
    MissingResultLocation(JobId),
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for an [`Orchestrator`].
///
/// # Invariants
/// - `build` succeeds only when store, engine, and fetcher are configured.
#[derive(Default)]
pub struct OrchestratorBuilder {
    /// Cache store handle.
    store: Option<SharedCacheStore>,
    /// Query engine client.
    engine: Option<Arc<dyn QueryEngine>>,
    /// Result fetcher.
    fetcher: Option<Arc<dyn ResultFetcher>>,
    /// Entry TTL in seconds.
    ttl_seconds: Option<i64>,
}

/// Builder validation errors.
#[derive(Debug, Error)]
pub enum OrchestratorBuildError {
    /// No cache store was configured.
    #[error("orchestrator requires a cache store")]
    MissingStore,
    /// No query engine was configured.
    #[error("orchestrator requires a query engine")]
    MissingEngine,
    /// No result fetcher was configured.
    #[error("orchestrator requires a result fetcher")]
    MissingFetcher,
}

impl OrchestratorBuilder {
    /// Sets the cache store.
    #[must_use]
    pub fn store(mut self, store: SharedCacheStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the query engine.
    #[must_use]
    pub fn engine(mut self, engine: impl QueryEngine + 'static) -> Self {
        self.engine = Some(Arc::new(engine));
        self
    }

    /// Sets the result fetcher.
    #[must_use]
    pub fn fetcher(mut self, fetcher: impl ResultFetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Overrides the entry TTL in seconds.
    #[must_use]
    pub const fn ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }

    /// Builds the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorBuildError`] when a collaborator is missing.
    pub fn build(self) -> Result<Orchestrator, OrchestratorBuildError> {
        Ok(Orchestrator {
            store: self.store.ok_or(OrchestratorBuildError::MissingStore)?,
            engine: self.engine.ok_or(OrchestratorBuildError::MissingEngine)?,
            fetcher: self.fetcher.ok_or(OrchestratorBuildError::MissingFetcher)?,
            ttl_seconds: self.ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS),
        })
    }
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// The request-cycle state machine over injected collaborators.
///
/// # Invariants
/// - Holds no per-request mutable state; safe to clone and share across
///   concurrent request handlers.
#[derive(Clone)]
pub struct Orchestrator {
    /// Cache store handle.
    store: SharedCacheStore,
    /// Query engine client.
    engine: Arc<dyn QueryEngine>,
    /// Result fetcher.
    fetcher: Arc<dyn ResultFetcher>,
    /// Entry TTL in seconds.
    ttl_seconds: i64,
}

impl Orchestrator {
    /// Returns a builder for the orchestrator.
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Drives one validated request through the state machine.
    ///
    /// `now` is the host-supplied current time used for TTL decisions and
    /// entry timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] on store, engine, or fetch failure, on a
    /// terminal FAILED/CANCELLED job, or on a succeeded job with no result
    /// location.
    pub fn handle(
        &self,
        request: &RouteRequest,
        now: Timestamp,
    ) -> Result<QueryResponse, OrchestratorError> {
        let query = CanonicalQuery::from_request(request);
        let fingerprint = query.fingerprint();
        let entry = self.store.get_entry(&fingerprint, now)?;
        let Some(entry) = entry else {
            return self.submit_first(request, &query, now);
        };
        if entry.status.is_in_flight() {
            return self.advance_in_flight(request, &entry, now);
        }
        match entry.status {
            JobStatus::Succeeded => self.serve_succeeded(request, &entry, now),
            status => Err(OrchestratorError::JobFailed {
                job_id: entry.job_id,
                status,
            }),
        }
    }

    /// Handles the cache-miss path: submit, then create-if-absent.
    fn submit_first(
        &self,
        request: &RouteRequest,
        query: &CanonicalQuery,
        now: Timestamp,
    ) -> Result<QueryResponse, OrchestratorError> {
        let job_id = self.engine.submit(query)?;
        let entry = CacheEntry::new_running(
            query.fingerprint(),
            job_id,
            now,
            now.plus_seconds(self.ttl_seconds),
        );
        let outcome = self.store.create_if_absent(&entry)?;
        if outcome.created {
            return Ok(QueryResponse::Processing {
                phase: ProcessingPhase::Started,
                job_id: outcome.current.job_id,
            });
        }
        // Lost the race: drop our submission's bookkeeping and serve the
        // winning entry. The extra engine job is abandoned.
        let winner = outcome.current;
        if winner.status.is_in_flight() {
            return Ok(QueryResponse::Processing {
                phase: ProcessingPhase::Processing,
                job_id: winner.job_id,
            });
        }
        match winner.status {
            JobStatus::Succeeded => self.serve_succeeded(request, &winner, now),
            status => Err(OrchestratorError::JobFailed {
                job_id: winner.job_id,
                status,
            }),
        }
    }

    /// Polls the engine for an in-flight entry and advances the store.
    fn advance_in_flight(
        &self,
        request: &RouteRequest,
        entry: &CacheEntry,
        now: Timestamp,
    ) -> Result<QueryResponse, OrchestratorError> {
        let poll = self.engine.poll(&entry.job_id)?;
        if poll.state.is_in_flight() {
            return Ok(QueryResponse::Processing {
                phase: ProcessingPhase::Processing,
                job_id: entry.job_id.clone(),
            });
        }
        match poll.state {
            JobStatus::Succeeded => {
                let location = match &entry.result_location {
                    Some(location) => location.clone(),
                    None => poll.result_location.ok_or_else(|| {
                        OrchestratorError::MissingResultLocation(entry.job_id.clone())
                    })?,
                };
                let _applied = self.store.update_status(
                    &entry.fingerprint,
                    JobStatus::Succeeded,
                    Some(&location),
                    now,
                )?;
                self.serve_location(request, &location)
            }
            status => {
                let _applied =
                    self.store.update_status(&entry.fingerprint, status, None, now)?;
                Err(OrchestratorError::JobFailed {
                    job_id: entry.job_id.clone(),
                    status,
                })
            }
        }
    }

    /// Serves a SUCCEEDED entry, recovering a lost result location if needed.
    fn serve_succeeded(
        &self,
        request: &RouteRequest,
        entry: &CacheEntry,
        now: Timestamp,
    ) -> Result<QueryResponse, OrchestratorError> {
        if let Some(location) = &entry.result_location {
            return self.serve_location(request, location);
        }
        let poll = self.engine.poll(&entry.job_id)?;
        let location = poll
            .result_location
            .ok_or_else(|| OrchestratorError::MissingResultLocation(entry.job_id.clone()))?;
        let _applied =
            self.store.update_status(&entry.fingerprint, JobStatus::Succeeded, Some(&location), now)?;
        self.serve_location(request, &location)
    }

    /// Fetches and transforms the materialized result.
    fn serve_location(
        &self,
        request: &RouteRequest,
        location: &ResultLocation,
    ) -> Result<QueryResponse, OrchestratorError> {
        let rows = self.fetcher.fetch(location)?;
        let outcome = transform(request, &rows);
        Ok(QueryResponse::Ready {
            payload: outcome.payload,
            skipped: outcome.skipped,
        })
    }
}
