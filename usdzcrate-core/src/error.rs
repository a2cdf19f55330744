//! Error types for usdzcrate

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for usdzcrate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Mesh is empty: {0}")]
    EmptyMesh(String),

    #[error("Failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {details}")]
    Parse { path: PathBuf, details: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// Wrap any displayable failure as an output write error for `path`.
    pub fn output_write(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Error::OutputWrite {
            path: path.into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, err.to_string()),
        }
    }

    /// Whether this error aborts a conversion because of the input side.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InputNotFound { .. }
                | Error::EmptyMesh(_)
                | Error::Parse { .. }
                | Error::UnsupportedFormat(_)
        )
    }
}

/// Result type alias for usdzcrate operations
pub type Result<T> = std::result::Result<T, Error>;
