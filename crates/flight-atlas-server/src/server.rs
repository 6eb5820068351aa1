// crates/flight-atlas-server/src/server.rs
// ============================================================================
// Module: Flight Atlas HTTP Server
// Description: axum application serving the three query endpoints.
// Purpose: Map HTTP requests onto the orchestrator and shape responses.
// Dependencies: axum, flight-atlas-core, flight-atlas-engine-http, flight-atlas-store-sqlite, serde_json, tokio
// ============================================================================

//! ## Overview
//! The server builds its components from validated configuration, then serves
//! `/routes`, `/airlines`, and `/airports` over axum. Handler logic lives in
//! [`handle_query`], a pure function from request parameters and a timestamp
//! to a status code and JSON body; the axum layer adds time, blocking-task
//! placement, and CORS headers.
//! Invariants:
//! - Every response, including errors and preflight, carries permissive CORS
//!   headers.
//! - Validation failures map to 400, in-flight acknowledgements to 202,
//!   materialized results to 200, and backend failures to 500.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use axum::Router;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use flight_atlas_core::InMemoryCacheStore;
use flight_atlas_core::Orchestrator;
use flight_atlas_core::OrchestratorError;
use flight_atlas_core::ProcessingPhase;
use flight_atlas_core::QueryResponse;
use flight_atlas_core::SharedCacheStore;
use flight_atlas_core::Timestamp;
use flight_atlas_core::normalize_request;
use flight_atlas_engine_http::HttpQueryEngine;
use flight_atlas_engine_http::HttpResultFetcher;
use flight_atlas_store_sqlite::SqliteCacheStore;
use flight_atlas_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::AtlasConfig;
use crate::config::CacheStoreType;
use crate::config::ConfigError;
use crate::telemetry::NoopMetrics;
use crate::telemetry::QueryEndpoint;
use crate::telemetry::QueryMetricEvent;
use crate::telemetry::QueryMetrics;
use crate::telemetry::QueryOutcome;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server construction and transport errors.
#[derive(Debug, Error)]
pub enum AtlasServerError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A component could not be constructed.
    #[error("server init error: {0}")]
    Init(String),
    /// The listener could not bind or serve.
    #[error("server transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct ServerState {
    /// The request-cycle orchestrator.
    orchestrator: Orchestrator,
    /// Metrics sink for request outcomes.
    metrics: Arc<dyn QueryMetrics>,
}

impl ServerState {
    /// Creates handler state from an orchestrator and a metrics sink.
    #[must_use]
    pub fn new(orchestrator: Orchestrator, metrics: Arc<dyn QueryMetrics>) -> Self {
        Self {
            orchestrator,
            metrics,
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// The configured HTTP server, ready to serve.
pub struct AtlasServer {
    /// Handler state.
    state: ServerState,
    /// Bound listener address.
    bind: SocketAddr,
}

impl AtlasServer {
    /// Builds the server and all of its components from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasServerError`] when the configuration is invalid or a
    /// component cannot be constructed.
    pub fn from_config(config: &AtlasConfig) -> Result<Self, AtlasServerError> {
        config.validate()?;
        let bind: SocketAddr = config
            .server
            .bind
            .parse()
            .map_err(|_| AtlasServerError::Init(format!("unbindable address: {}", config.server.bind)))?;
        let store = build_cache_store(config)?;
        let engine = HttpQueryEngine::new(&config.engine)
            .map_err(|err| AtlasServerError::Init(err.to_string()))?;
        let fetcher = HttpResultFetcher::new(&config.engine)
            .map_err(|err| AtlasServerError::Init(err.to_string()))?;
        let orchestrator = Orchestrator::builder()
            .store(store)
            .engine(engine)
            .fetcher(fetcher)
            .ttl_seconds(config.cache.ttl_seconds)
            .build()
            .map_err(|err| AtlasServerError::Init(err.to_string()))?;
        Ok(Self {
            state: ServerState::new(orchestrator, Arc::new(NoopMetrics)),
            bind,
        })
    }

    /// Replaces the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn QueryMetrics>) -> Self {
        self.state.metrics = metrics;
        self
    }

    /// Returns the axum router over this server's state.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Binds the listener and serves until the process is stopped.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), AtlasServerError> {
        let router = build_router(self.state);
        let listener = tokio::net::TcpListener::bind(self.bind)
            .await
            .map_err(|err| AtlasServerError::Transport(err.to_string()))?;
        axum::serve(listener, router)
            .await
            .map_err(|err| AtlasServerError::Transport(err.to_string()))
    }
}

/// Builds the cache store selected by configuration.
fn build_cache_store(config: &AtlasConfig) -> Result<SharedCacheStore, AtlasServerError> {
    match config.cache.store {
        CacheStoreType::Memory => Ok(SharedCacheStore::from_store(InMemoryCacheStore::new())),
        CacheStoreType::Sqlite => {
            let path = config
                .cache
                .path
                .clone()
                .ok_or_else(|| AtlasServerError::Init("sqlite cache store requires path".to_string()))?;
            let store = SqliteCacheStore::new(&SqliteStoreConfig {
                path,
                busy_timeout_ms: config.cache.busy_timeout_ms,
                journal_mode: config.cache.journal_mode,
                sync_mode: config.cache.sync_mode,
            })
            .map_err(|err| AtlasServerError::Init(err.to_string()))?;
            Ok(SharedCacheStore::from_store(store))
        }
    }
}

// ============================================================================
// SECTION: Query Handling
// ============================================================================

/// Handles one query request against the orchestrator.
///
/// Returns the HTTP status code and JSON body for the response. This is the
/// whole handler: the axum layer only supplies `now`, moves the call onto a
/// blocking-capable thread, and attaches CORS headers.
#[must_use]
pub fn handle_query(
    state: &ServerState,
    path: &str,
    airport: Option<&str>,
    airline_code: Option<&str>,
    now: Timestamp,
) -> (StatusCode, serde_json::Value) {
    let endpoint = classify_endpoint(path);
    let request = match normalize_request(path, airport, airline_code) {
        Ok(request) => request,
        Err(err) => {
            state.metrics.record_request(QueryMetricEvent {
                endpoint,
                outcome: QueryOutcome::Rejected,
                rows_skipped: 0,
            });
            return (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }));
        }
    };
    match state.orchestrator.handle(&request, now) {
        Ok(QueryResponse::Ready {
            payload,
            skipped,
        }) => {
            state.metrics.record_request(QueryMetricEvent {
                endpoint,
                outcome: QueryOutcome::Ready,
                rows_skipped: skipped.len(),
            });
            match serde_json::to_value(&payload) {
                Ok(body) => (StatusCode::OK, body),
                Err(err) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": format!("payload serialization failed: {err}") }),
                ),
            }
        }
        Ok(QueryResponse::Processing {
            phase,
            job_id,
        }) => {
            let outcome = match phase {
                ProcessingPhase::Started => QueryOutcome::Started,
                ProcessingPhase::Processing => QueryOutcome::Processing,
            };
            state.metrics.record_request(QueryMetricEvent {
                endpoint,
                outcome,
                rows_skipped: 0,
            });
            (
                StatusCode::ACCEPTED,
                json!({ "status": phase.as_str(), "query_id": job_id }),
            )
        }
        Err(err) => {
            state.metrics.record_request(QueryMetricEvent {
                endpoint,
                outcome: QueryOutcome::Error,
                rows_skipped: 0,
            });
            (status_for_error(&err), json!({ "error": err.to_string() }))
        }
    }
}

/// Classifies a path for telemetry labels.
fn classify_endpoint(path: &str) -> QueryEndpoint {
    match path {
        "/routes" => QueryEndpoint::Routes,
        "/airlines" => QueryEndpoint::Airlines,
        "/airports" => QueryEndpoint::Airports,
        _ => QueryEndpoint::Invalid,
    }
}

/// Maps orchestrator errors onto HTTP status codes.
const fn status_for_error(err: &OrchestratorError) -> StatusCode {
    match err {
        OrchestratorError::Store(_)
        | OrchestratorError::Engine(_)
        | OrchestratorError::Fetch(_)
        | OrchestratorError::JobFailed { .. }
        | OrchestratorError::MissingResultLocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// SECTION: Axum Plumbing
// ============================================================================

/// Query parameters accepted by the three endpoints.
#[derive(Debug, Deserialize)]
struct QueryParams {
    /// Source airport filter.
    airport: Option<String>,
    /// Airline code filter.
    airline_code: Option<String>,
}

/// Builds the application router.
fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/routes", get(routes_handler).options(preflight_handler))
        .route("/airlines", get(airlines_handler).options(preflight_handler))
        .route("/airports", get(airports_handler).options(preflight_handler))
        .with_state(state)
}

/// Serves `/routes`.
async fn routes_handler(
    State(state): State<ServerState>,
    Query(params): Query<QueryParams>,
) -> Response {
    dispatch(&state, "/routes", &params)
}

/// Serves `/airlines`.
async fn airlines_handler(
    State(state): State<ServerState>,
    Query(params): Query<QueryParams>,
) -> Response {
    dispatch(&state, "/airlines", &params)
}

/// Serves `/airports`.
async fn airports_handler(
    State(state): State<ServerState>,
    Query(params): Query<QueryParams>,
) -> Response {
    dispatch(&state, "/airports", &params)
}

/// Answers CORS preflight with an empty 200.
async fn preflight_handler() -> Response {
    with_cors(StatusCode::OK.into_response())
}

/// Runs the blocking query cycle and shapes the HTTP response.
fn dispatch(state: &ServerState, path: &str, params: &QueryParams) -> Response {
    let started = Instant::now();
    let (status, body) = tokio::task::block_in_place(|| {
        handle_query(
            state,
            path,
            params.airport.as_deref(),
            params.airline_code.as_deref(),
            now_timestamp(),
        )
    });
    state.metrics.record_latency(
        QueryMetricEvent {
            endpoint: classify_endpoint(path),
            outcome: outcome_for_status(status),
            rows_skipped: 0,
        },
        started.elapsed(),
    );
    with_cors((status, axum::Json(body)).into_response())
}

/// Maps a response status onto a coarse outcome label for latency metrics.
fn outcome_for_status(status: StatusCode) -> QueryOutcome {
    if status == StatusCode::OK {
        QueryOutcome::Ready
    } else if status == StatusCode::ACCEPTED {
        QueryOutcome::Processing
    } else if status == StatusCode::BAD_REQUEST {
        QueryOutcome::Rejected
    } else {
        QueryOutcome::Error
    }
}

/// Attaches permissive CORS headers to a response.
fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,OPTIONS"),
    );
    response
}

/// Reads the current unix-seconds time for the request cycle.
fn now_timestamp() -> Timestamp {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX));
    Timestamp::from_unix_seconds(seconds)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::classify_endpoint;
    use super::with_cors;
    use crate::telemetry::QueryEndpoint;

    #[test]
    fn cors_headers_are_attached_to_every_response() {
        let response = with_cors(StatusCode::BAD_REQUEST.into_response());
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-headers"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET,OPTIONS");
    }

    #[test]
    fn unknown_paths_classify_as_invalid() {
        assert_eq!(classify_endpoint("/routes"), QueryEndpoint::Routes);
        assert_eq!(classify_endpoint("/flights"), QueryEndpoint::Invalid);
    }
}
