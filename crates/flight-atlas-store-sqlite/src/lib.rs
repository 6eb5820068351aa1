// crates/flight-atlas-store-sqlite/src/lib.rs
// ============================================================================
// Module: Flight Atlas SQLite Store Library
// Description: Durable cache store backed by SQLite.
// Purpose: Persist fingerprint cache entries across restarts.
// Dependencies: flight-atlas-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate implements the core `CacheStore` interface on top of `SQLite`.
//! Atomicity for `create_if_absent` and `update_status` comes from immediate
//! transactions on a single writer connection, which makes the dedup primitive
//! safe across concurrent server threads and across processes sharing the
//! database file.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteCacheStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
