// crates/flight-atlas-core/src/core/entry.rs
// ============================================================================
// Module: Flight Atlas Cache Entry
// Description: Cache entry record, job status, and transition rules.
// Purpose: Track one backend job per fingerprint with forward-only status.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A cache entry tracks the backend job serving one fingerprint. Entries are
//! created once per first-seen fingerprint, advance status monotonically, and
//! are logically destroyed by TTL expiry at the store level.
//! Invariants:
//! - At most one entry exists per fingerprint at any time.
//! - Status transitions only move forward; terminal states never regress.
//! - `result_location` is set at most once, only alongside or after
//!   `Succeeded`, and is immutable thereafter.
//! - Entries past `ttl_expiry` are treated as absent regardless of status.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::Fingerprint;
use crate::core::identifiers::JobId;
use crate::core::identifiers::ResultLocation;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Job Status
// ============================================================================

/// Lifecycle status of a backend job tracked by a cache entry.
///
/// # Invariants
/// - Variants are stable for serialization and store persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job accepted by the engine but not yet running.
    Queued,
    /// Job executing on the engine.
    Running,
    /// Job finished and produced a result object.
    Succeeded,
    /// Job failed on the engine.
    Failed,
    /// Job cancelled on the engine.
    Cancelled,
}

impl JobStatus {
    /// Returns the stable wire label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a stable wire label back into a status.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "QUEUED" => Some(Self::Queued),
            "RUNNING" => Some(Self::Running),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true for states that end a job's lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    /// Returns true for states with an engine job still in flight.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    /// Forward-progress rank used by the transition rule.
    const fn rank(self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Running => 1,
            Self::Succeeded | Self::Failed | Self::Cancelled => 2,
        }
    }

    /// Returns true when a transition from `self` to `next` moves forward.
    ///
    /// Terminal states admit no transition, not even to themselves; stores
    /// treat a repeated terminal write as a rejected no-op.
    #[must_use]
    pub const fn admits_transition(self, next: Self) -> bool {
        !self.is_terminal() && next.rank() >= self.rank()
    }
}

// ============================================================================
// SECTION: Cache Entry
// ============================================================================

/// Persisted record tracking a fingerprint's job and result state.
///
/// # Invariants
/// - `fingerprint` is the store's primary key; see module overview for the
///   single-entry, forward-only, and TTL rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key derived from the canonical query.
    pub fingerprint: Fingerprint,
    /// Engine job serving this fingerprint.
    pub job_id: JobId,
    /// Current job status.
    pub status: JobStatus,
    /// Creation time of the entry.
    pub created_at: Timestamp,
    /// Time of the last status update.
    pub last_updated: Timestamp,
    /// Expiry time after which the entry is treated as absent.
    pub ttl_expiry: Timestamp,
    /// Result object location, set once after success.
    pub result_location: Option<ResultLocation>,
}

impl CacheEntry {
    /// Creates the initial entry for a freshly submitted job.
    #[must_use]
    pub const fn new_running(
        fingerprint: Fingerprint,
        job_id: JobId,
        now: Timestamp,
        ttl_expiry: Timestamp,
    ) -> Self {
        Self {
            fingerprint,
            job_id,
            status: JobStatus::Running,
            created_at: now,
            last_updated: now,
            ttl_expiry,
            result_location: None,
        }
    }

    /// Returns true when the entry is past its TTL at the given time.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.ttl_expiry <= now
    }
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

    use super::CacheEntry;
    use super::JobStatus;
    use crate::core::identifiers::Fingerprint;
    use crate::core::identifiers::JobId;
    use crate::core::time::Timestamp;

    #[test]
    fn status_labels_round_trip() {
        for status in [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Succeeded,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("DONE"), None);
    }

    #[test]
    fn terminal_states_admit_no_transition() {
        for terminal in [JobStatus::Succeeded, JobStatus::Failed, JobStatus::Cancelled] {
            for next in [
                JobStatus::Queued,
                JobStatus::Running,
                JobStatus::Succeeded,
                JobStatus::Failed,
                JobStatus::Cancelled,
            ] {
                assert!(!terminal.admits_transition(next));
            }
        }
    }

    #[test]
    fn in_flight_states_move_forward_only() {
        assert!(JobStatus::Queued.admits_transition(JobStatus::Running));
        assert!(JobStatus::Running.admits_transition(JobStatus::Succeeded));
        assert!(JobStatus::Running.admits_transition(JobStatus::Running));
        assert!(!JobStatus::Running.admits_transition(JobStatus::Queued));
    }

    #[test]
    fn entry_expiry_compares_against_supplied_time() {
        let entry = CacheEntry::new_running(
            Fingerprint::from_hex("ab".repeat(32)),
            JobId::new("job-1"),
            Timestamp::from_unix_seconds(100),
            Timestamp::from_unix_seconds(200),
        );
        assert!(!entry.is_expired(Timestamp::from_unix_seconds(199)));
        assert!(entry.is_expired(Timestamp::from_unix_seconds(200)));
    }
}
