// crates/flight-atlas-server/src/lib.rs
// ============================================================================
// Module: Flight Atlas Server Library
// Description: HTTP query surface over the cache orchestrator.
// Purpose: Expose the routes, airlines, and airports endpoints.
// Dependencies: axum, flight-atlas-core, flight-atlas-engine-http, flight-atlas-store-sqlite
// ============================================================================

//! ## Overview
//! The server crate wires configuration, the cache store, the HTTP engine
//! clients, and the orchestrator into an axum application serving the three
//! query endpoints. Handler logic is a pure function from request parameters
//! and a timestamp to a status code and JSON body, so tests exercise the
//! surface without sockets.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod server;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AtlasConfig;
pub use config::CacheSection;
pub use config::CacheStoreType;
pub use config::ConfigError;
pub use config::ServerSection;
pub use server::AtlasServer;
pub use server::AtlasServerError;
pub use server::ServerState;
pub use server::handle_query;
pub use telemetry::NoopMetrics;
pub use telemetry::QueryMetrics;
