//! Error types for smart-line.
//!
//! Defines the main error enum used throughout the application. "User not
//! found" and "query returned nothing" are outcomes, not errors, and live in
//! [`crate::auth::AuthOutcome`] and [`crate::app::RunOutcome`].

use thiserror::Error;

/// Main error type for smart-line operations.
#[derive(Error, Debug)]
pub enum SmartLineError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, constraint violations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Completion endpoint errors (non-success status, transport failure, bad body)
    #[error("Remote service error: {0}")]
    Remote(String),

    /// Configuration errors (invalid config file, missing API key, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Console or file output errors.
    #[error("Output error: {0}")]
    Output(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SmartLineError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a remote service error with the given message.
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an output error with the given message.
    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Remote(_) => "Remote Service Error",
            Self::Config(_) => "Configuration Error",
            Self::Output(_) => "Output Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

impl From<std::io::Error> for SmartLineError {
    fn from(e: std::io::Error) -> Self {
        Self::Output(e.to_string())
    }
}

/// Result type alias using SmartLineError.
pub type Result<T> = std::result::Result<T, SmartLineError>;
