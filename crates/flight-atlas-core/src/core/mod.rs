// crates/flight-atlas-core/src/core/mod.rs
// ============================================================================
// Module: Flight Atlas Core Model
// Description: Request, query, cache entry, row, and payload types.
// Purpose: Group the domain model consumed by interfaces and runtime.
// Dependencies: crate::core submodules
// ============================================================================

//! ## Overview
//! The core model holds the typed request surface, canonical query and
//! fingerprint derivation, cache entry state, tabular result rows, and the
//! client-facing payload shapes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod entry;
pub mod identifiers;
pub mod payload;
pub mod query;
pub mod request;
pub mod rows;
pub mod time;
