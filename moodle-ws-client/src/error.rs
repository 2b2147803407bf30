//! Error types for the Moodle web-service client

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating credentials
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Credentials file does not exist
    #[error("The credentials file could not be located at {}", .path.display())]
    NotFound {
        /// The path that was looked up
        path: PathBuf,
    },

    /// Credentials file exists but could not be read
    #[error("Failed to read credentials file: {0}")]
    Io(#[from] std::io::Error),

    /// Credentials file is not valid TOML
    #[error("Failed to parse credentials: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `moodle_api` section is missing or empty
    #[error("The 'moodle_api' section in the credentials file is empty")]
    MissingSection,

    /// A required field is missing or empty
    #[error("The '{0}' variable is empty")]
    EmptyField(&'static str),

    /// The site URL cannot be used as a base for the REST endpoint
    #[error("Invalid site URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL as written in the credentials
        url: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Errors that can occur while constructing a Moodle client
///
/// Remote-call outcomes are never reported through this type; they are
/// returned as [`Envelope`](crate::Envelope) values.
#[derive(Error, Debug)]
pub enum MoodleError {
    /// Credentials could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Client initialization failed
    #[error("Client initialization failed: {0}")]
    ClientInit(String),
}
