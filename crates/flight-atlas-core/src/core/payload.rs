// crates/flight-atlas-core/src/core/payload.rs
// ============================================================================
// Module: Flight Atlas Response Payloads
// Description: Endpoint-tagged response payloads and GeoJSON shapes.
// Purpose: Model client-facing results as typed structures per endpoint.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Response payloads are one tagged variant per endpoint: a FeatureCollection
//! of LineStrings for routes, a FeatureCollection of Points for airports, and
//! a code-to-name mapping for airlines. The variants serialize untagged so
//! clients receive plain GeoJSON or a plain JSON object.
//! Invariants:
//! - `kind` fields always carry the GeoJSON literal for their shape.
//! - Coordinates are `[lon, lat]` pairs, matching the stored WKT points.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Geometry
// ============================================================================

/// GeoJSON LineString geometry with exactly two endpoints.
///
/// # Invariants
/// - `coordinates` holds the source endpoint followed by the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStringGeometry {
    /// GeoJSON geometry type, always `"LineString"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `[lon, lat]` endpoint pairs, source first.
    pub coordinates: Vec<[f64; 2]>,
}

impl LineStringGeometry {
    /// Creates a two-point line from source to destination.
    #[must_use]
    pub fn new(src: [f64; 2], dst: [f64; 2]) -> Self {
        Self {
            kind: "LineString".to_string(),
            coordinates: vec![src, dst],
        }
    }
}

/// GeoJSON Point geometry.
///
/// # Invariants
/// - `coordinates` is a `[lon, lat]` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    /// GeoJSON geometry type, always `"Point"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `[lon, lat]` coordinate pair.
    pub coordinates: [f64; 2],
}

impl PointGeometry {
    /// Creates a point at the given `[lon, lat]` position.
    #[must_use]
    pub fn new(coordinates: [f64; 2]) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates,
        }
    }
}

// ============================================================================
// SECTION: Route Features
// ============================================================================

/// Properties attached to a route feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteProperties {
    /// Operating airline code.
    pub airline_code: String,
    /// Source airport code.
    pub src_airport: String,
    /// Destination airport code.
    pub dst_airport: String,
}

/// One route rendered as a GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteFeature {
    /// GeoJSON object type, always `"Feature"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Line geometry from source to destination airport.
    pub geometry: LineStringGeometry,
    /// Route properties.
    pub properties: RouteProperties,
}

impl RouteFeature {
    /// Creates a route feature from geometry and properties.
    #[must_use]
    pub fn new(geometry: LineStringGeometry, properties: RouteProperties) -> Self {
        Self {
            kind: "Feature".to_string(),
            geometry,
            properties,
        }
    }
}

/// FeatureCollection of route LineStrings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCollection {
    /// GeoJSON object type, always `"FeatureCollection"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Route features.
    pub features: Vec<RouteFeature>,
}

impl RouteCollection {
    /// Creates a collection from route features.
    #[must_use]
    pub fn new(features: Vec<RouteFeature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }
}

// ============================================================================
// SECTION: Airport Features
// ============================================================================

/// Properties attached to an airport feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportProperties {
    /// FAA code, null when the source carries the `0.0` sentinel.
    #[serde(rename = "FAA")]
    pub faa: Option<String>,
    /// IATA code.
    #[serde(rename = "IATA")]
    pub iata: String,
    /// Display name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Reference URL for the airport.
    pub url: String,
    /// Number of destinations served.
    pub destinations: i64,
}

/// One airport rendered as a GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportFeature {
    /// GeoJSON object type, always `"Feature"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Point geometry of the airport.
    pub geometry: PointGeometry,
    /// Airport properties.
    pub properties: AirportProperties,
}

impl AirportFeature {
    /// Creates an airport feature from geometry and properties.
    #[must_use]
    pub fn new(geometry: PointGeometry, properties: AirportProperties) -> Self {
        Self {
            kind: "Feature".to_string(),
            geometry,
            properties,
        }
    }
}

/// FeatureCollection of airport Points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportCollection {
    /// GeoJSON object type, always `"FeatureCollection"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Airport features.
    pub features: Vec<AirportFeature>,
}

impl AirportCollection {
    /// Creates a collection from airport features.
    #[must_use]
    pub fn new(features: Vec<AirportFeature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }
}

// ============================================================================
// SECTION: Response Payload
// ============================================================================

/// Endpoint-tagged response payload.
///
/// # Invariants
/// - Serializes untagged: clients see plain GeoJSON or a plain JSON mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    /// `/routes` response: LineString FeatureCollection.
    Routes(RouteCollection),
    /// `/airports` response: Point FeatureCollection.
    Airports(AirportCollection),
    /// `/airlines` response: airline code to display name.
    Airlines(BTreeMap<String, String>),
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

    use serde_json::json;

    use super::LineStringGeometry;
    use super::ResponsePayload;
    use super::RouteCollection;
    use super::RouteFeature;
    use super::RouteProperties;

    #[test]
    fn routes_payload_serializes_as_plain_geojson() {
        let feature = RouteFeature::new(
            LineStringGeometry::new([-122.3, 47.6], [-73.9, 40.6]),
            RouteProperties {
                airline_code: "AA".to_string(),
                src_airport: "SEA".to_string(),
                dst_airport: "JFK".to_string(),
            },
        );
        let payload = ResponsePayload::Routes(RouteCollection::new(vec![feature]));
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], json!("FeatureCollection"));
        assert_eq!(value["features"][0]["geometry"]["type"], json!("LineString"));
        assert_eq!(
            value["features"][0]["geometry"]["coordinates"],
            json!([[-122.3, 47.6], [-73.9, 40.6]])
        );
    }
}
