// crates/flight-atlas-server/src/config.rs
// ============================================================================
// Module: Server Configuration
// Description: TOML-backed configuration for the query server.
// Purpose: Declare bind address, cache store, TTL, and engine endpoints.
// Dependencies: flight-atlas-core, flight-atlas-engine-http, flight-atlas-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration loads from a TOML file and validates before any component is
//! built. Every field has a conservative default except the engine base URL,
//! which has no sensible default and must be set explicitly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use flight_atlas_core::DEFAULT_TTL_SECONDS;
use flight_atlas_engine_http::HttpEngineConfig;
use flight_atlas_store_sqlite::SqliteStoreMode;
use flight_atlas_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// Configuration file failed TOML parsing.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Socket address to bind, as `host:port`.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Returns the default bind address.
fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Cache store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheStoreType {
    /// In-process memory store; entries are lost on restart.
    #[default]
    Memory,
    /// Durable `SQLite` store.
    Sqlite,
}

/// Cache store settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Selected store backend.
    #[serde(default)]
    pub store: CacheStoreType,
    /// Database file path, required for the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Entry TTL in seconds.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: i64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            store: CacheStoreType::Memory,
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

/// Returns the default `SQLite` busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Returns the default cache entry TTL.
const fn default_ttl_seconds() -> i64 {
    DEFAULT_TTL_SECONDS
}

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Root configuration for the query server.
///
/// # Invariants
/// - `validate` passes before any component is constructed from this value.
#[derive(Debug, Clone, Deserialize)]
pub struct AtlasConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSection,
    /// Cache store settings.
    #[serde(default)]
    pub cache: CacheSection,
    /// Engine job API and result fetch settings.
    pub engine: HttpEngineConfig,
}

impl AtlasConfig {
    /// Loads and parses configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a constraint fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address: {}", self.server.bind)))?;
        if self.cache.store == CacheStoreType::Sqlite && self.cache.path.is_none() {
            return Err(ConfigError::Invalid("sqlite cache store requires path".to_string()));
        }
        if self.cache.ttl_seconds <= 0 {
            return Err(ConfigError::Invalid("ttl_seconds must be greater than zero".to_string()));
        }
        if self.engine.base_url.is_empty() {
            return Err(ConfigError::Invalid("engine base_url must be set".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
