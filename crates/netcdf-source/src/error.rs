//! Error types for NetCDF reading operations.

use covjson::CovJsonError;
use thiserror::Error;

/// Result type for NetCDF source operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF reading.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error reported by the NetCDF library
    #[error("NetCDF error: {0}")]
    Library(#[from] netcdf::Error),

    /// Variable type that has no numeric representation
    #[error("Unsupported type for '{variable}': {vartype}")]
    UnsupportedType { variable: String, vartype: String },
}

impl From<NetCdfError> for CovJsonError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::UnsupportedType { .. } => CovJsonError::InvalidInput(err.to_string()),
            NetCdfError::IoError(_) | NetCdfError::Library(_) => {
                CovJsonError::Source(err.to_string())
            }
        }
    }
}
