//! Error types for glyphsync.
//!
//! Library crates use [`GlyphSyncError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all glyphsync operations.
#[derive(Debug, thiserror::Error)]
pub enum GlyphSyncError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network or decode failure while retrieving remote data.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Document parsing error (remote catalog, SVG artwork).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The local registry file is missing, unreadable, or corrupt.
    #[error("registry error at {path:?}: {message}")]
    Store { path: PathBuf, message: String },

    /// A single artwork file could not be fetched, sanitized, or written.
    #[error("asset error ({url} -> {path:?}): {message}")]
    Asset {
        url: String,
        path: PathBuf,
        message: String,
    },

    /// The manifest could not be rendered or written.
    #[error("export error at {path:?}: {message}")]
    Export { path: PathBuf, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad identifier, code point overflow, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GlyphSyncError>;

impl GlyphSyncError {
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

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a registry store error for the given file.
    pub fn store(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Store {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an asset error carrying the source location and target path.
    pub fn asset(url: impl Into<String>, path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Asset {
            url: url.into(),
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a manifest export error for the given file.
    pub fn export(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Export {
            path: path.into(),
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
