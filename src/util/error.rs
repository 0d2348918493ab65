//! Error types for layerbridge.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for layer and mesh file operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File extension is not one of the supported mesh formats
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// File has a supported extension but could not be parsed
    #[error("Invalid {format} file {path}: {reason}")]
    FileFormat {
        path: PathBuf,
        format: &'static str,
        reason: String,
    },

    /// No readable files were given
    #[error("No input files")]
    EmptyInput,

    /// Feature column does not match the row count of its table
    #[error("Feature '{name}' has {actual} rows, expected {expected}")]
    FeatureLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Points and surfaces were mixed, or a layer of the wrong kind was given
    #[error("Kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Time column holds a value that is not a non-negative integer
    #[error("Invalid time index {0}")]
    InvalidTimeIndex(f64),

    /// Unknown layer kind string
    #[error("Invalid layer kind: {0}")]
    InvalidKind(String),

    /// Inconsistent geometry (bad coordinate width, out of range faces, ...)
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// Configuration could not be loaded or saved
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a file format error for `path`.
    pub fn format(path: impl Into<PathBuf>, format: &'static str, reason: impl Into<String>) -> Self {
        Self::FileFormat {
            path: path.into(),
            format,
            reason: reason.into(),
        }
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }
}

/// Result type alias for layerbridge operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::format("a/b.ply", "PLY", "missing header");
        let msg = e.to_string();
        assert!(msg.contains("PLY"));
        assert!(msg.contains("a/b.ply"));
        assert!(msg.contains("missing header"));

        let e = Error::FeatureLength { name: "f1".into(), expected: 5, actual: 3 };
        assert!(e.to_string().contains("f1"));
        assert!(e.to_string().contains("5"));
        assert!(e.to_string().contains("3"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
