//! NetCDF data source for CoverageJSON output.
//!
//! [`NetCdfSource`] opens a NetCDF-3 or NetCDF-4 file and exposes it through
//! the [`covjson::DataSource`] trait. Coordinate variables are detected from
//! CF attributes and conventional names, packed values are unpacked, fill
//! values become missing data, and CF time offsets are decoded to RFC 3339
//! timestamps where the calendar allows.

pub mod axes;
pub mod cf_time;
pub mod error;
pub mod reader;

pub use error::{NetCdfError, NetCdfResult};
pub use reader::{silence_hdf5_errors, NetCdfSource};
