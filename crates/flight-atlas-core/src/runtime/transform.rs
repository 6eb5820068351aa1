// crates/flight-atlas-core/src/runtime/transform.rs
// ============================================================================
// Module: Flight Atlas Result Transformer
// Description: Converts tabular rows into endpoint-specific payloads.
// Purpose: Materialize engine output as GeoJSON or mapping responses.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The transformer is a pure function from `(request, rows)` to a typed
//! [`ResponsePayload`]. A row that fails to decode is skipped with a recorded
//! reason and never aborts the transform; skip records are returned alongside
//! the payload so the host can count them in telemetry. Rows excluded by the
//! defensive client-side airline filter are dropped silently, matching the
//! server-side query filter they mirror.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::payload::AirportCollection;
use crate::core::payload::AirportFeature;
use crate::core::payload::AirportProperties;
use crate::core::payload::LineStringGeometry;
use crate::core::payload::PointGeometry;
use crate::core::payload::ResponsePayload;
use crate::core::payload::RouteCollection;
use crate::core::payload::RouteFeature;
use crate::core::payload::RouteProperties;
use crate::core::request::RouteRequest;
use crate::core::request::RoutesFilter;
use crate::core::rows::ResultRow;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// FAA sentinel value that the dataset uses for "no FAA code".
const FAA_NULL_SENTINEL: &str = "0.0";
/// Airline name rewritten for display.
const AIRLINE_ALIAS_SOURCE: &str = "Delta Connection";
/// Display name substituted for the alias source.
const AIRLINE_ALIAS_DISPLAY: &str = "Delta Air Lines";

// ============================================================================
// SECTION: Skip Records
// ============================================================================

/// Reason a row was excluded from the transformed payload.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowSkipReason {
    /// A required column was absent.
    #[error("missing column: {column}")]
    MissingColumn {
        /// The absent column name.
        column: String,
    },
    /// A geometry column did not parse as a WKT point.
    #[error("malformed geometry in column: {column}")]
    MalformedGeometry {
        /// The offending column name.
        column: String,
    },
    /// A numeric column did not parse as an integer.
    #[error("malformed count in column: {column}")]
    MalformedCount {
        /// The offending column name.
        column: String,
    },
}

/// Record of one skipped row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSkip {
    /// Zero-based index of the row in the fetched result.
    pub row_index: usize,
    /// Why the row was skipped.
    pub reason: RowSkipReason,
}

/// Transformed payload plus the rows that failed to decode.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutcome {
    /// The endpoint-specific response payload.
    pub payload: ResponsePayload,
    /// Skipped-row records, in row order.
    pub skipped: Vec<RowSkip>,
}

// ============================================================================
// SECTION: WKT Parsing
// ============================================================================

/// Parses a `POINT (lon lat)` WKT value into a `[lon, lat]` pair.
fn parse_wkt_point(value: &str) -> Option<[f64; 2]> {
    let rest = value.trim().strip_prefix("POINT")?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    let mut parts = inner.split_whitespace();
    let lon = parts.next()?.parse::<f64>().ok()?;
    let lat = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some([lon, lat])
}

// ============================================================================
// SECTION: Per-Row Decoding
// ============================================================================

/// Reads a required string column or reports the missing-column skip reason.
fn required_column<'a>(row: &'a ResultRow, column: &str) -> Result<&'a str, RowSkipReason> {
    row.get(column).ok_or_else(|| RowSkipReason::MissingColumn {
        column: column.to_string(),
    })
}

/// Reads and parses a required WKT point column.
fn required_point(row: &ResultRow, column: &str) -> Result<[f64; 2], RowSkipReason> {
    let value = required_column(row, column)?;
    parse_wkt_point(value).ok_or_else(|| RowSkipReason::MalformedGeometry {
        column: column.to_string(),
    })
}

/// Decodes one flights row into a route feature.
fn decode_route_row(row: &ResultRow) -> Result<RouteFeature, RowSkipReason> {
    let src = required_point(row, "src_geometry")?;
    let dst = required_point(row, "dst_geometry")?;
    let properties = RouteProperties {
        airline_code: required_column(row, "airline_code")?.to_string(),
        src_airport: required_column(row, "src_airport")?.to_string(),
        dst_airport: required_column(row, "dst_airport")?.to_string(),
    };
    Ok(RouteFeature::new(LineStringGeometry::new(src, dst), properties))
}

/// Decodes one airports row into an airport feature.
fn decode_airport_row(row: &ResultRow) -> Result<AirportFeature, RowSkipReason> {
    let position = required_point(row, "geometry")?;
    let faa = required_column(row, "faa")?;
    let destinations_raw = required_column(row, "destinations")?;
    let destinations =
        destinations_raw.parse::<i64>().map_err(|_| RowSkipReason::MalformedCount {
            column: "destinations".to_string(),
        })?;
    let properties = AirportProperties {
        faa: (faa != FAA_NULL_SENTINEL).then(|| faa.to_string()),
        iata: required_column(row, "iata")?.to_string(),
        name: required_column(row, "title")?.to_string(),
        url: required_column(row, "url")?.to_string(),
        destinations,
    };
    Ok(AirportFeature::new(PointGeometry::new(position), properties))
}

/// Decodes one airlines row into a code/display-name pair.
fn decode_airline_row(row: &ResultRow) -> Result<(String, String), RowSkipReason> {
    let code = required_column(row, "airline_code")?.to_string();
    let name = required_column(row, "name")?;
    let display = if name == AIRLINE_ALIAS_SOURCE {
        AIRLINE_ALIAS_DISPLAY.to_string()
    } else {
        name.to_string()
    };
    Ok((code, display))
}

// ============================================================================
// SECTION: Transform
// ============================================================================

/// Converts fetched rows into the endpoint payload for a validated request.
///
/// Pure; rows that fail to decode are skipped with a reason and never abort
/// the transform. When a `/routes` request carries an airline filter, rows
/// for other airlines are additionally excluded here as a defensive second
/// filter.
#[must_use]
pub fn transform(request: &RouteRequest, rows: &[ResultRow]) -> TransformOutcome {
    match request {
        RouteRequest::Routes {
            filter,
        } => transform_routes(filter, rows),
        RouteRequest::Airlines {
            ..
        } => transform_airlines(rows),
        RouteRequest::Airports => transform_airports(rows),
    }
}

/// Builds the LineString collection for `/routes`.
fn transform_routes(filter: &RoutesFilter, rows: &[ResultRow]) -> TransformOutcome {
    let airline_filter = match filter {
        RoutesFilter::AirlineCode(code) => Some(code.as_str()),
        RoutesFilter::SrcAirport(_) => None,
    };
    let mut features = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        if let Some(wanted) = airline_filter
            && row.get("airline_code") != Some(wanted)
        {
            continue;
        }
        match decode_route_row(row) {
            Ok(feature) => features.push(feature),
            Err(reason) => skipped.push(RowSkip {
                row_index,
                reason,
            }),
        }
    }
    TransformOutcome {
        payload: ResponsePayload::Routes(RouteCollection::new(features)),
        skipped,
    }
}

/// Builds the Point collection for `/airports`.
fn transform_airports(rows: &[ResultRow]) -> TransformOutcome {
    let mut features = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        match decode_airport_row(row) {
            Ok(feature) => features.push(feature),
            Err(reason) => skipped.push(RowSkip {
                row_index,
                reason,
            }),
        }
    }
    TransformOutcome {
        payload: ResponsePayload::Airports(AirportCollection::new(features)),
        skipped,
    }
}

/// Builds the code-to-name mapping for `/airlines`.
fn transform_airlines(rows: &[ResultRow]) -> TransformOutcome {
    let mut mapping = BTreeMap::new();
    let mut skipped = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        match decode_airline_row(row) {
            Ok((code, display)) => {
                mapping.insert(code, display);
            }
            Err(reason) => skipped.push(RowSkip {
                row_index,
                reason,
            }),
        }
    }
    TransformOutcome {
        payload: ResponsePayload::Airlines(mapping),
        skipped,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
