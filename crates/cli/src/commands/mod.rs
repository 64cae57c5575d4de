//! CLI subcommands.

pub mod authorize;
pub mod probe;

use marketlink_gateway::config::ConfigError;
use marketlink_gateway::platform::PlatformError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Environment configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The platform could not be reached or rejected the request.
    #[error("{0}")]
    Platform(#[from] PlatformError),

    /// Output could not be rendered.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}
