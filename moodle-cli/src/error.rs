//! Error types for the CLI

use thiserror::Error;

/// Main CLI error type
///
/// Failed remote calls are not errors; they are printed as envelopes.
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials could not be loaded
    #[error("{0}")]
    Credentials(#[from] moodle_ws_client::ConfigError),

    /// Client construction failed
    #[error("{0}")]
    Client(#[from] moodle_ws_client::MoodleError),

    /// Input file could not be parsed or output could not be rendered
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
