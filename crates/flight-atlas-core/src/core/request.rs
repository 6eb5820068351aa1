// crates/flight-atlas-core/src/core/request.rs
// ============================================================================
// Module: Flight Atlas Request Model
// Description: Validated request types and the request normalizer.
// Purpose: Parse raw path and query parameters into typed, safe requests.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The request normalizer is the only entry point from untrusted client input
//! into the core. Filter values are validated at construction boundaries so
//! that canonical query interpolation never sees raw input.
//! Invariants:
//! - [`AirportCode`] holds exactly three ASCII uppercase letters.
//! - [`AirlineCode`] holds two or three ASCII uppercase letters or digits.
//! - `/routes` carries exactly one filter; when both are supplied the source
//!   airport takes precedence and the airline code is dropped.
//! - `/airports` carries no filters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Filter Codes
// ============================================================================

/// Three-letter source airport code (IATA style).
///
/// # Invariants
/// - Exactly three ASCII uppercase letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AirportCode(String);

impl AirportCode {
    /// Parses and validates an airport code.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAirport`] when the value is not
    /// exactly three ASCII uppercase letters.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let bytes = value.as_bytes();
        if bytes.len() == 3 && bytes.iter().all(u8::is_ascii_uppercase) {
            Ok(Self(value.to_string()))
        } else {
            Err(ValidationError::InvalidAirport {
                value: value.to_string(),
            })
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Two-or-three character airline code.
///
/// # Invariants
/// - Two or three ASCII characters, each an uppercase letter or digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AirlineCode(String);

impl AirlineCode {
    /// Parses and validates an airline code.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAirline`] when the value is not two
    /// or three uppercase alphanumeric ASCII characters.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let bytes = value.as_bytes();
        let class_ok =
            bytes.iter().all(|byte| byte.is_ascii_uppercase() || byte.is_ascii_digit());
        if (2..=3).contains(&bytes.len()) && class_ok {
            Ok(Self(value.to_string()))
        } else {
            Err(ValidationError::InvalidAirline {
                value: value.to_string(),
            })
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AirlineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Validated Requests
// ============================================================================

/// Filter applied to a `/routes` request.
///
/// # Invariants
/// - Exactly one filter is present; the normalizer enforces precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutesFilter {
    /// Filter routes departing from a source airport.
    SrcAirport(AirportCode),
    /// Filter routes operated by an airline.
    AirlineCode(AirlineCode),
}

/// Validated request for one of the three endpoints.
///
/// # Invariants
/// - Construction goes through [`normalize_request`]; filter values are
///   always validated before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "endpoint", rename_all = "snake_case")]
pub enum RouteRequest {
    /// Flight routes, always filtered.
    Routes {
        /// The single active filter.
        filter: RoutesFilter,
    },
    /// Airline code-to-name mapping, optionally filtered.
    Airlines {
        /// Optional airline code filter.
        airline_code: Option<AirlineCode>,
    },
    /// All airports, never filtered.
    Airports,
}

// ============================================================================
// SECTION: Validation Errors
// ============================================================================

/// Request validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Unknown endpoint path.
    #[error("unknown endpoint: {path}")]
    UnknownEndpoint {
        /// The rejected path.
        path: String,
    },
    /// Airport code failed validation.
    #[error("invalid airport parameter: {value}")]
    InvalidAirport {
        /// The rejected value.
        value: String,
    },
    /// Airline code failed validation.
    #[error("invalid airline_code parameter: {value}")]
    InvalidAirline {
        /// The rejected value.
        value: String,
    },
    /// `/routes` requires a filter.
    #[error("missing parameter: /routes requires airport or airline_code")]
    MissingFilter,
    /// `/airports` accepts no filters.
    #[error("no parameters for this endpoint")]
    ForbiddenFilter,
}

// ============================================================================
// SECTION: Normalizer
// ============================================================================

/// Strips a stray query-string suffix and collapses empty values to `None`.
fn clean_parameter(value: Option<&str>) -> Option<&str> {
    let value = value?.trim();
    let value = value.split('?').next().unwrap_or(value);
    if value.is_empty() { None } else { Some(value) }
}

/// Validates raw request parameters into a typed [`RouteRequest`].
///
/// Values are cleaned of stray `?suffix` fragments before validation. On
/// `/routes` with both filters present, `airport` takes precedence and
/// `airline_code` is ignored. On `/airlines` a supplied `airport` value is
/// validated then dropped; only the airline code participates in the query.
/// Pure; performs no side effects.
///
/// # Errors
///
/// Returns [`ValidationError`] for unknown paths, malformed filter values,
/// a missing `/routes` filter, or any filter on `/airports`.
pub fn normalize_request(
    path: &str,
    airport: Option<&str>,
    airline_code: Option<&str>,
) -> Result<RouteRequest, ValidationError> {
    let airport = clean_parameter(airport).map(AirportCode::parse).transpose()?;
    let airline_code = clean_parameter(airline_code).map(AirlineCode::parse).transpose()?;
    match path {
        "/routes" => match (airport, airline_code) {
            (Some(src), _) => Ok(RouteRequest::Routes {
                filter: RoutesFilter::SrcAirport(src),
            }),
            (None, Some(airline)) => Ok(RouteRequest::Routes {
                filter: RoutesFilter::AirlineCode(airline),
            }),
            (None, None) => Err(ValidationError::MissingFilter),
        },
        "/airlines" => Ok(RouteRequest::Airlines {
            airline_code,
        }),
        "/airports" => {
            if airport.is_some() || airline_code.is_some() {
                return Err(ValidationError::ForbiddenFilter);
            }
            Ok(RouteRequest::Airports)
        }
        other => Err(ValidationError::UnknownEndpoint {
            path: other.to_string(),
        }),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
