//! Error types for docbind.
//!
//! Library crates use [`DocbindError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docbind operations.
///
/// Every variant is fatal to a run: the generator fails loudly when the upstream
/// documentation changes shape instead of emitting silently wrong bindings.
#[derive(Debug, thiserror::Error)]
pub enum DocbindError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching the reference page.
    #[error("network error: {0}")]
    Network(String),

    /// The documentation HTML violated an assumed structural invariant
    /// (missing table column, unknown type token, ...).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A selector string could not be compiled.
    #[error("selector error: {message}")]
    Selector { message: String },

    /// Prose could not be classified (no return-type template matched).
    #[error("classification error: {message}")]
    Classification { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (snapshot schema mismatch, invalid notation, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// JSON encoding/decoding error for snapshot files.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocbindError>;

impl DocbindError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a selector compile error.
    pub fn selector(msg: impl Into<String>) -> Self {
        Self::Selector {
            message: msg.into(),
        }
    }

    /// Create a classification error.
    pub fn classification(msg: impl Into<String>) -> Self {
        Self::Classification {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for DocbindError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
