// crates/flight-atlas-engine-http/src/client.rs
// ============================================================================
// Module: HTTP Engine Client
// Description: Blocking HTTP clients for the engine job API and results.
// Purpose: Submit queries, poll jobs, and fetch bounded result objects.
// Dependencies: flight-atlas-core, reqwest, serde, thiserror, url
// ============================================================================

//! ## Overview
//! The engine exposes a small job API: `POST {base}/jobs` submits a query and
//! returns a job identifier, `GET {base}/jobs/{id}` reports job state and,
//! once succeeded, the result object URL. Both clients here are bounded:
//! timeouts always apply, redirects are never followed, and result bodies are
//! read through a hard size cap. Engine responses are untrusted input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use flight_atlas_core::CanonicalQuery;
use flight_atlas_core::EngineError;
use flight_atlas_core::FetchError;
use flight_atlas_core::JobId;
use flight_atlas_core::JobPoll;
use flight_atlas_core::JobStatus;
use flight_atlas_core::QueryEngine;
use flight_atlas_core::ResultFetcher;
use flight_atlas_core::ResultLocation;
use flight_atlas_core::ResultRow;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::csv::decode_rows;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration shared by the engine client and the result fetcher.
///
/// # Invariants
/// - `base_url` must parse as an absolute HTTP(S) URL.
/// - `max_response_bytes` is enforced as a hard upper bound on result bodies.
/// - `timeout_ms` applies to the full request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpEngineConfig {
    /// Base URL of the engine job API.
    pub base_url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum result body size allowed, in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Returns the default request timeout in milliseconds.
const fn default_timeout_ms() -> u64 {
    10_000
}

/// Returns the default result body size cap.
const fn default_max_response_bytes() -> usize {
    8 * 1024 * 1024
}

/// Returns the default user agent.
fn default_user_agent() -> String {
    "flight-atlas/0.1".to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Client construction errors.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The base URL did not parse or has an unsupported scheme.
    #[error("invalid engine base url: {0}")]
    InvalidBaseUrl(String),
    /// The underlying HTTP client could not be built.
    #[error("http client build failed: {0}")]
    Build(String),
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Job submission request body.
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    /// Query text to execute.
    query: &'a str,
}

/// Job submission response body.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    /// Identifier of the accepted job.
    job_id: String,
}

/// Job poll response body.
#[derive(Debug, Deserialize)]
struct PollResponse {
    /// Engine-reported job state label.
    state: String,
    /// Result object URL, present once the job has succeeded.
    #[serde(default)]
    result_location: Option<String>,
}

// ============================================================================
// SECTION: Engine Client
// ============================================================================

/// Blocking HTTP client for the engine job API.
///
/// # Invariants
/// - Redirects are not followed.
/// - Every call is a single bounded round trip; no inline retries.
pub struct HttpQueryEngine {
    /// Normalized base URL ending in a slash.
    base: Url,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl HttpQueryEngine {
    /// Creates an engine client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] when the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &HttpEngineConfig) -> Result<Self, HttpClientError> {
        Ok(Self {
            base: parse_base_url(&config.base_url)?,
            client: build_client(config)?,
        })
    }

    /// Joins a path below the engine base URL.
    fn endpoint(&self, path: &str) -> Result<Url, String> {
        self.base.join(path).map_err(|err| format!("invalid engine endpoint: {err}"))
    }
}

impl QueryEngine for HttpQueryEngine {
    fn submit(&self, query: &CanonicalQuery) -> Result<JobId, EngineError> {
        let url = self.endpoint("jobs").map_err(EngineError::Submit)?;
        let response = self
            .client
            .post(url)
            .json(&SubmitRequest {
                query: query.as_str(),
            })
            .send()
            .map_err(|err| EngineError::Submit(format!("engine unreachable: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Submit(format!("engine rejected submission: {status}")));
        }
        let body: SubmitResponse = response
            .json()
            .map_err(|err| EngineError::Submit(format!("malformed submit response: {err}")))?;
        Ok(JobId::new(body.job_id))
    }

    fn poll(&self, job_id: &JobId) -> Result<JobPoll, EngineError> {
        let url = self.endpoint(&format!("jobs/{job_id}")).map_err(EngineError::Poll)?;
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| EngineError::Poll(format!("engine unreachable: {err}")))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(EngineError::Poll(format!("unknown job: {job_id}")));
        }
        if !status.is_success() {
            return Err(EngineError::Poll(format!("engine poll failed: {status}")));
        }
        let body: PollResponse = response
            .json()
            .map_err(|err| EngineError::Poll(format!("malformed poll response: {err}")))?;
        let state = JobStatus::parse(&body.state)
            .ok_or_else(|| EngineError::Poll(format!("unknown job state: {}", body.state)))?;
        Ok(JobPoll {
            state,
            result_location: body.result_location.map(ResultLocation::new),
        })
    }
}

// ============================================================================
// SECTION: Result Fetcher
// ============================================================================

/// Blocking HTTP fetcher for materialized result objects.
///
/// # Invariants
/// - Bodies beyond `max_response_bytes` fail closed.
pub struct HttpResultFetcher {
    /// HTTP client used for outbound requests.
    client: Client,
    /// Hard upper bound on result body size.
    max_response_bytes: usize,
}

impl HttpResultFetcher {
    /// Creates a result fetcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError`] when the HTTP client cannot be built.
    pub fn new(config: &HttpEngineConfig) -> Result<Self, HttpClientError> {
        Ok(Self {
            client: build_client(config)?,
            max_response_bytes: config.max_response_bytes,
        })
    }
}

impl ResultFetcher for HttpResultFetcher {
    fn fetch(&self, location: &ResultLocation) -> Result<Vec<ResultRow>, FetchError> {
        let url = Url::parse(location.as_str())
            .map_err(|err| FetchError::Malformed(format!("invalid result location: {err}")))?;
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| FetchError::Io(format!("result fetch failed: {err}")))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::Missing(location.as_str().to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Io(format!("result fetch failed: {status}")));
        }
        let body = read_response_limited(&mut response, self.max_response_bytes)?;
        let text = String::from_utf8(body)
            .map_err(|_| FetchError::Malformed("result object is not utf-8".to_string()))?;
        decode_rows(&text).map_err(|err| FetchError::Malformed(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses and normalizes the engine base URL.
fn parse_base_url(raw: &str) -> Result<Url, HttpClientError> {
    let mut normalized = raw.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized)
        .map_err(|err| HttpClientError::InvalidBaseUrl(err.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(HttpClientError::InvalidBaseUrl(format!("unsupported scheme: {other}"))),
    }
}

/// Builds the bounded blocking HTTP client.
fn build_client(config: &HttpEngineConfig) -> Result<Client, HttpClientError> {
    Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(config.user_agent.clone())
        .redirect(Policy::none())
        .build()
        .map_err(|err| HttpClientError::Build(err.to_string()))
}

/// Reads a response body while enforcing the configured size cap.
fn read_response_limited(
    response: &mut reqwest::blocking::Response,
    max_bytes: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_len = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| FetchError::Io("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err(FetchError::Malformed("result object exceeds size limit".to_string()));
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    handle
        .read_to_end(&mut buf)
        .map_err(|_| FetchError::Io("failed to read result object".to_string()))?;
    if buf.len() > max_bytes {
        return Err(FetchError::Malformed("result object exceeds size limit".to_string()));
    }
    Ok(buf)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
