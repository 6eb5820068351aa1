// crates/flight-atlas-core/src/core/query.rs
// ============================================================================
// Module: Flight Atlas Canonical Query
// Description: Canonical query text and fingerprint derivation.
// Purpose: Map validated requests to deterministic cache keys.
// Dependencies: serde, sha2
// ============================================================================

//! ## Overview
//! A canonical query is the deterministic SQL text derived from a validated
//! request; its SHA-256 hex digest is the cache fingerprint. Equal normalized
//! requests always yield byte-identical canonical queries, and the
//! fingerprint is used verbatim as the cache store key.
//! Invariants:
//! - Interpolated filter values come only from validated
//!   [`crate::core::request`] types; raw input never reaches this module.
//! - Fingerprints are lowercase hex SHA-256, 64 characters long.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::core::identifiers::Fingerprint;
use crate::core::request::RouteRequest;
use crate::core::request::RoutesFilter;

// ============================================================================
// SECTION: Canonical Query
// ============================================================================

/// Deterministic textual form of a request, used as the hashing input.
///
/// # Invariants
/// - Derived purely from a validated [`RouteRequest`]; byte-identical for
///   equal normalized requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalQuery(String);

impl CanonicalQuery {
    /// Builds the canonical query for a validated request.
    #[must_use]
    pub fn from_request(request: &RouteRequest) -> Self {
        let text = match request {
            RouteRequest::Routes {
                filter: RoutesFilter::SrcAirport(code),
            } => format!("SELECT * FROM flights WHERE src_airport = '{code}'"),
            RouteRequest::Routes {
                filter: RoutesFilter::AirlineCode(code),
            } => format!("SELECT * FROM flights WHERE airline_code = '{code}'"),
            RouteRequest::Airlines {
                airline_code: Some(code),
            } => format!("SELECT * FROM airlines WHERE airline_code = '{code}'"),
            RouteRequest::Airlines {
                airline_code: None,
            } => "SELECT * FROM airlines".to_string(),
            RouteRequest::Airports => "SELECT * FROM airports".to_string(),
        };
        Self(text)
    }

    /// Returns the query text as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Computes the SHA-256 fingerprint of the canonical query bytes.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let digest = Sha256::digest(self.0.as_bytes());
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        Fingerprint::from_hex(hex)
    }
}

impl fmt::Display for CanonicalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
