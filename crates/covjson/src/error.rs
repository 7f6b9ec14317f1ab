//! Coverage assembly error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for coverage operations.
pub type CovJsonResult<T> = Result<T, CovJsonError>;

/// Errors that can occur while assembling or writing a coverage.
#[derive(Debug, Error)]
pub enum CovJsonError {
    /// Requested variable is not present in the data source.
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// An axis required to build the domain or its referencing is missing.
    #[error("Missing axis: {0}")]
    MissingAxis(String),

    /// Input data is unusable as given.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Number of values read does not match the declared shape.
    #[error("Shape mismatch for '{variable}': shape {shape:?} holds {expected} values, found {actual}")]
    ShapeMismatch {
        variable: String,
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// Tile shape cannot partition the array.
    #[error("Invalid tile shape {tile_shape:?}: {reason}")]
    InvalidTileShape {
        tile_shape: Vec<usize>,
        reason: String,
    },

    /// The dataset's axes match no reference system rule.
    #[error("Unsupported axis combination: {0}")]
    UnsupportedAxisCombination(String),

    /// Writing an output document failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be rendered as JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The data source failed to provide a value.
    #[error("Data source error: {0}")]
    Source(String),

    /// Writer configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CovJsonError {
    /// Create an I/O error for a path.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Short category name used in logs.
    pub fn category(&self) -> &'static str {
        match self {
            CovJsonError::VariableNotFound(_)
            | CovJsonError::MissingAxis(_)
            | CovJsonError::InvalidInput(_)
            | CovJsonError::UnsupportedAxisCombination(_)
            | CovJsonError::Source(_) => "input",
            CovJsonError::ShapeMismatch { .. } | CovJsonError::InvalidTileShape { .. } => "shape",
            CovJsonError::Io { .. } => "io",
            CovJsonError::Serialization(_) => "serialization",
            CovJsonError::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for CovJsonError {
    fn from(err: serde_json::Error) -> Self {
        CovJsonError::Serialization(err.to_string())
    }
}
