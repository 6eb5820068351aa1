// crates/flight-atlas-engine-http/src/lib.rs
// ============================================================================
// Module: Flight Atlas HTTP Engine Library
// Description: HTTP-backed query engine and result fetcher.
// Purpose: Talk to the analytical engine's job API and result objects.
// Dependencies: flight-atlas-core, reqwest, url
// ============================================================================

//! ## Overview
//! This crate implements the core `QueryEngine` and `ResultFetcher`
//! interfaces over HTTP. Requests are bounded: timeouts always apply,
//! redirects are never followed, and result bodies are capped in size.
//! Result objects are delimited text decoded by the in-crate CSV reader.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod csv;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::HttpClientError;
pub use client::HttpEngineConfig;
pub use client::HttpQueryEngine;
pub use client::HttpResultFetcher;
pub use csv::CsvError;
pub use csv::decode_rows;
