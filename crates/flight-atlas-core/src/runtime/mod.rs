// crates/flight-atlas-core/src/runtime/mod.rs
// ============================================================================
// Module: Flight Atlas Runtime
// Description: Orchestration state machine and result transformation.
// Purpose: Group the request-cycle logic built on the core interfaces.
// Dependencies: crate::runtime submodules
// ============================================================================

//! ## Overview
//! The runtime holds the per-request orchestration state machine and the pure
//! row-to-payload transformer.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod orchestrator;
pub mod transform;
