// crates/flight-atlas-server/src/telemetry.rs
// ============================================================================
// Module: Server Telemetry
// Description: Observability hooks for query request handling.
// Purpose: Provide metric events and latency buckets without hard deps.
// Dependencies: flight-atlas-core
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for query request counters
//! and latency histograms. It is intentionally dependency-light so
//! deployments can plug in Prometheus or OpenTelemetry without redesign.
//! Labels never carry raw parameter values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default latency buckets in milliseconds for request histograms.
pub const QUERY_LATENCY_BUCKETS_MS: &[u64] =
    &[1, 2, 5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000];

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Query endpoint classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum QueryEndpoint {
    /// `/routes` requests.
    Routes,
    /// `/airlines` requests.
    Airlines,
    /// `/airports` requests.
    Airports,
    /// Unknown or malformed paths.
    Invalid,
}

impl QueryEndpoint {
    /// Returns a stable label for the endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Routes => "routes",
            Self::Airlines => "airlines",
            Self::Airports => "airports",
            Self::Invalid => "invalid",
        }
    }
}

/// Query request outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum QueryOutcome {
    /// Materialized result served.
    Ready,
    /// This request started the backend job.
    Started,
    /// Job already in flight; acknowledged.
    Processing,
    /// Request failed validation.
    Rejected,
    /// Backend or store failure.
    Error,
}

impl QueryOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Started => "started",
            Self::Processing => "processing",
            Self::Rejected => "rejected",
            Self::Error => "error",
        }
    }
}

/// Query request metric event payload.
#[derive(Debug, Clone)]
pub struct QueryMetricEvent {
    /// Endpoint classification.
    pub endpoint: QueryEndpoint,
    /// Request outcome.
    pub outcome: QueryOutcome,
    /// Rows skipped during result transformation.
    pub rows_skipped: usize,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for query requests and latencies.
pub trait QueryMetrics: Send + Sync {
    /// Records a request counter event.
    fn record_request(&self, event: QueryMetricEvent);
    /// Records a latency observation for the request.
    fn record_latency(&self, event: QueryMetricEvent, latency: Duration);
}

/// No-op metrics sink.
///
/// # Invariants
/// - Metrics are intentionally discarded.
pub struct NoopMetrics;

impl QueryMetrics for NoopMetrics {
    fn record_request(&self, _event: QueryMetricEvent) {}

    fn record_latency(&self, _event: QueryMetricEvent, _latency: Duration) {}
}
