//! Error types for the observability engine.
//!
//! The surface is deliberately small: recording and query operations are pure
//! in-memory mutations that cannot fail, so fallibility only appears on the
//! configuration path.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
