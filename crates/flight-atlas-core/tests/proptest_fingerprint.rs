// crates/flight-atlas-core/tests/proptest_fingerprint.rs
// ============================================================================
// Module: Fingerprint Property Tests
// Description: Property tests for canonical query and fingerprint derivation.
// Purpose: Verify fingerprints are a pure, injective function of the request.
// Dependencies: flight-atlas-core, proptest
// ============================================================================

//! Property tests for canonical query and fingerprint derivation.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]

use flight_atlas_core::CanonicalQuery;
use flight_atlas_core::normalize_request;
use proptest::prelude::proptest;

proptest! {
    #[test]
    fn fingerprint_is_deterministic(airport in "[A-Z]{3}") {
        let first = normalize_request("/routes", Some(&airport), None).unwrap();
        let second = normalize_request("/routes", Some(&airport), None).unwrap();
        let fp_first = CanonicalQuery::from_request(&first).fingerprint();
        let fp_second = CanonicalQuery::from_request(&second).fingerprint();
        assert_eq!(fp_first, fp_second);
    }

    #[test]
    fn fingerprint_ignores_stray_query_suffix(airport in "[A-Z]{3}", suffix in "[a-z=&]{0,8}") {
        let plain = normalize_request("/routes", Some(&airport), None).unwrap();
        let suffixed_value = format!("{airport}?{suffix}");
        let suffixed = normalize_request("/routes", Some(&suffixed_value), None).unwrap();
        assert_eq!(
            CanonicalQuery::from_request(&plain).fingerprint(),
            CanonicalQuery::from_request(&suffixed).fingerprint()
        );
    }

    #[test]
    fn distinct_filters_yield_distinct_fingerprints(
        first in "[A-Z]{3}",
        second in "[A-Z]{3}",
    ) {
        let by_first = normalize_request("/routes", Some(&first), None).unwrap();
        let by_second = normalize_request("/routes", Some(&second), None).unwrap();
        let fp_first = CanonicalQuery::from_request(&by_first).fingerprint();
        let fp_second = CanonicalQuery::from_request(&by_second).fingerprint();
        if first == second {
            assert_eq!(fp_first, fp_second);
        } else {
            assert_ne!(fp_first, fp_second);
        }
    }

    #[test]
    fn endpoints_never_collide(airline in "[A-Z0-9]{2,3}") {
        let routes = normalize_request("/routes", None, Some(&airline)).unwrap();
        let airlines = normalize_request("/airlines", None, Some(&airline)).unwrap();
        assert_ne!(
            CanonicalQuery::from_request(&routes).fingerprint(),
            CanonicalQuery::from_request(&airlines).fingerprint()
        );
    }

    #[test]
    fn fingerprint_shape_is_stable(airline in "[A-Z0-9]{2,3}") {
        let request = normalize_request("/airlines", None, Some(&airline)).unwrap();
        let fingerprint = CanonicalQuery::from_request(&request).fingerprint();
        assert_eq!(fingerprint.as_str().len(), 64);
        assert!(fingerprint
            .as_str()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
