// crates/flight-atlas-cli/src/main.rs
// ============================================================================
// Module: Flight Atlas CLI Entry Point
// Description: Command dispatcher for the query cache server.
// Purpose: Start the server and validate configuration from the shell.
// Dependencies: clap, flight-atlas-server, thiserror, tokio
// ============================================================================

//! ## Overview
//! The CLI starts the query cache server from a TOML configuration file and
//! offers an offline configuration check. The server needs a multi-thread
//! runtime because the query cycle runs blocking HTTP calls on the handler
//! thread.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use flight_atlas_server::AtlasConfig;
use flight_atlas_server::AtlasServer;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "flight-atlas", version)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the query cache server.
    Serve {
        /// Path to the TOML configuration file.
        #[arg(long, value_name = "PATH", default_value = "flight-atlas.toml")]
        config: PathBuf,
    },
    /// Validate a configuration file without starting the server.
    CheckConfig {
        /// Path to the TOML configuration file.
        #[arg(long, value_name = "PATH", default_value = "flight-atlas.toml")]
        config: PathBuf,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = write_stderr_line(&format!("error: {err}"));
            ExitCode::FAILURE
        }
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            config,
        } => command_serve(&config).await,
        Commands::CheckConfig {
            config,
        } => command_check_config(&config),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(config_path: &std::path::Path) -> Result<(), CliError> {
    let config = AtlasConfig::load(config_path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let server = AtlasServer::from_config(&config)
        .map_err(|err| CliError::new(format!("failed to start server: {err}")))?;
    write_stdout_line(&format!("flight-atlas serving on {}", config.server.bind))
        .map_err(|err| CliError::new(format!("stdout write failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))
}

/// Executes the `check-config` command.
fn command_check_config(config_path: &std::path::Path) -> Result<(), CliError> {
    let config = AtlasConfig::load(config_path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    config
        .validate()
        .map_err(|err| CliError::new(format!("invalid config: {err}")))?;
    write_stdout_line("config ok")
        .map_err(|err| CliError::new(format!("stdout write failed: {err}")))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes one line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(message.as_bytes())?;
    out.write_all(b"\n")
}

/// Writes one line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut err = std::io::stderr().lock();
    err.write_all(message.as_bytes())?;
    err.write_all(b"\n")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
