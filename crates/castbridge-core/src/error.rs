/*!
 * Error types for CastBridge core.
 *
 * This module defines the error type shared by the core plumbing
 * (configuration, logging, event channels).
 */
use thiserror::Error;

/// Error type for core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging setup error
    #[error("Logging error: {0}")]
    Logging(String),

    /// Event channel error
    #[error("Event error: {0}")]
    Event(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a logging error
    pub fn logging<S: Into<String>>(msg: S) -> Self {
        Error::Logging(msg.into())
    }

    /// Create an event error
    pub fn event<S: Into<String>>(msg: S) -> Self {
        Error::Event(msg.into())
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
