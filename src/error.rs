//! Error types for aql-exec.
//!
//! Every failure the pipeline can hit falls into one of these categories.
//! Only configuration errors abort a run; the others are logged and degrade
//! to a per-unit fallback.

use thiserror::Error;

/// Main error type for aql-exec operations.
#[derive(Error, Debug)]
pub enum AqlExecError {
    /// Missing or malformed connection profile.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Socket, timeout or HTTP protocol failure talking to the server.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Bind-variable or response JSON that could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Result destination could not be resolved, created or opened.
    #[error("Destination error: {0}")]
    Destination(String),

    /// Filesystem errors outside of the result destination.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AqlExecError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Creates a destination error with the given message.
    pub fn destination(msg: impl Into<String>) -> Self {
        Self::Destination(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Transport(_) => "Transport Error",
            Self::Parse(_) => "Parse Error",
            Self::Destination(_) => "Destination Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if this error should abort the whole run rather than a
    /// single query unit.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Internal(_))
    }
}

/// Result type alias using AqlExecError.
pub type Result<T> = std::result::Result<T, AqlExecError>;
