// crates/flight-atlas-core/src/core/time.rs
// ============================================================================
// Module: Flight Atlas Time Model
// Description: Canonical timestamp representation for cache entries.
// Purpose: Provide explicit, host-supplied time values for TTL decisions.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Flight Atlas embeds explicit unix-second timestamps in cache entries and
//! TTL comparisons. The core never reads wall-clock time directly; hosts must
//! supply the current time with each request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Unix-seconds timestamp used in cache entries and TTL checks.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - Ordering follows the underlying unix-second value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix seconds.
    #[must_use]
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Returns the timestamp as unix seconds.
    #[must_use]
    pub const fn unix_seconds(self) -> i64 {
        self.0
    }

    /// Returns a timestamp offset forward by the given number of seconds.
    #[must_use]
    pub const fn plus_seconds(self, seconds: i64) -> Self {
        Self(self.0.saturating_add(seconds))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
