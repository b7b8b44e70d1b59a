//! Common error types for gigmap

use thiserror::Error;

/// Common result type for gigmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across gigmap crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decode error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML encode error
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream event record store could not be read
    #[error("Event source error: {0}")]
    Source(String),

    /// Invalid user input or command argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
