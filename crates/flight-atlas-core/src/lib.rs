// crates/flight-atlas-core/src/lib.rs
// ============================================================================
// Module: Flight Atlas Core Library
// Description: Domain model, interfaces, and orchestration for query caching.
// Purpose: Turn validated route requests into cached analytical query results.
// Dependencies: serde, serde_json, sha2, thiserror
// ============================================================================

//! ## Overview
//! Flight Atlas Core contains the request model, canonical query
//! fingerprinting, the cache entry state machine, the backend interfaces, and
//! the [`Orchestrator`] that ties them together. The core is transport
//! agnostic and never reads wall-clock time; hosts supply timestamps.
//! Invariants:
//! - Fingerprints are a pure function of the normalized request.
//! - Cache entry status transitions only move forward.
//! - The orchestrator answers within one request cycle; it never waits for a
//!   backend job to finish.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::entry::CacheEntry;
pub use crate::core::entry::JobStatus;
pub use crate::core::identifiers::Fingerprint;
pub use crate::core::identifiers::JobId;
pub use crate::core::identifiers::ResultLocation;
pub use crate::core::payload::AirportCollection;
pub use crate::core::payload::AirportFeature;
pub use crate::core::payload::AirportProperties;
pub use crate::core::payload::LineStringGeometry;
pub use crate::core::payload::PointGeometry;
pub use crate::core::payload::ResponsePayload;
pub use crate::core::payload::RouteCollection;
pub use crate::core::payload::RouteFeature;
pub use crate::core::payload::RouteProperties;
pub use crate::core::query::CanonicalQuery;
pub use crate::core::request::AirlineCode;
pub use crate::core::request::AirportCode;
pub use crate::core::request::RouteRequest;
pub use crate::core::request::RoutesFilter;
pub use crate::core::request::ValidationError;
pub use crate::core::request::normalize_request;
pub use crate::core::rows::ResultRow;
pub use crate::core::time::Timestamp;
pub use crate::interfaces::CacheStore;
pub use crate::interfaces::CacheStoreError;
pub use crate::interfaces::CreateOutcome;
pub use crate::interfaces::EngineError;
pub use crate::interfaces::FetchError;
pub use crate::interfaces::InMemoryCacheStore;
pub use crate::interfaces::JobPoll;
pub use crate::interfaces::QueryEngine;
pub use crate::interfaces::ResultFetcher;
pub use crate::interfaces::SharedCacheStore;
pub use crate::runtime::orchestrator::DEFAULT_TTL_SECONDS;
pub use crate::runtime::orchestrator::Orchestrator;
pub use crate::runtime::orchestrator::OrchestratorBuildError;
pub use crate::runtime::orchestrator::OrchestratorBuilder;
pub use crate::runtime::orchestrator::OrchestratorError;
pub use crate::runtime::orchestrator::ProcessingPhase;
pub use crate::runtime::orchestrator::QueryResponse;
pub use crate::runtime::transform::RowSkip;
pub use crate::runtime::transform::RowSkipReason;
pub use crate::runtime::transform::TransformOutcome;
pub use crate::runtime::transform::transform;
