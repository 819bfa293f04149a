//! Error types for benchtree.
//!
//! Library crates use [`BenchTreeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all benchtree operations.
#[derive(Debug, thiserror::Error)]
pub enum BenchTreeError {
    /// No instance and/or experiment segment among a path's ancestors.
    #[error("cannot classify {path:?}: {message}")]
    Classification { path: PathBuf, message: String },

    /// Closing a cached experiment or instance-runs context failed.
    #[error("failed to close {scope} context: {source}")]
    ResourceClose {
        scope: &'static str,
        #[source]
        source: Box<BenchTreeError>,
    },

    /// A context could not be created or populated.
    #[error("context error: {0}")]
    Context(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (missing name, schema mismatch, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// JSON encoding or decoding error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BenchTreeError>;

impl BenchTreeError {
    /// Create a classification error for `path`.
    pub fn classification(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Classification {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a collaborator's close failure with the scope that failed.
    pub fn resource_close(scope: &'static str, source: BenchTreeError) -> Self {
        Self::ResourceClose {
            scope,
            source: Box::new(source),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    /// True for errors raised by ancestor classification.
    pub fn is_classification(&self) -> bool {
        matches!(self, Self::Classification { .. })
    }
}
