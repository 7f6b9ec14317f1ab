//! CoverageJSON document assembly and serialization.
//!
//! This crate turns gridded arrays and their metadata into CoverageJSON
//! documents. It covers the document model, the builders that assemble a
//! coverage from a [`DataSource`], tiling of large ranges into separately
//! addressable documents, and a serializer that pretty-prints the document
//! while keeping large numeric fields compact.
//!
//! # Example
//!
//! ```rust
//! use covjson::{CoverageWriter, MemorySink, MemorySource, MemoryVariable, WriterConfig};
//! use ndarray::{ArrayD, IxDyn};
//!
//! let values = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//! let source = MemorySource::new(vec![10.0, 11.0], vec![50.0, 51.0]).with_variable(
//!     "temperature",
//!     MemoryVariable::new(values, &["y", "x"]).with_units("K"),
//! );
//!
//! let config = WriterConfig::new("coverage.covjson", vec!["temperature".to_string()]);
//! let mut sink = MemorySink::new();
//! CoverageWriter::new(config, &source).write(&mut sink).unwrap();
//!
//! assert!(sink.get("coverage.covjson").unwrap().contains("\"values\": [1.0,2.0,3.0,4.0]"));
//! ```

pub mod builder;
pub mod config;
pub mod coverage_json;
pub mod error;
pub mod format;
pub mod linked_data;
pub mod parameters;
pub mod referencing;
pub mod sink;
pub mod source;
pub mod tiling;
pub mod writer;

// Re-export commonly used types
pub use config::{TilingConfig, WriterConfig};
pub use coverage_json::{
    AxisValue, Coverage, DataType, Domain, DomainAxis, DomainType, NdArray, NdValues, Range,
    TileSetEntry, TiledNdArray,
};
pub use error::{CovJsonError, CovJsonResult};
pub use format::{FormatMode, SelectiveSerializer};
pub use linked_data::LinkedDataContext;
pub use parameters::{I18nString, ObservedProperty, Parameter, Unit};
pub use referencing::{ReferenceSystem, ReferenceSystemConnection};
pub use sink::{FileSink, MemorySink, OutputSink};
pub use source::{Axis, AxisSet, DataSource, MemorySource, MemoryVariable};
pub use tiling::{Tile, TileSet};
pub use writer::{CoverageWriter, WriteSummary};

/// Default file extension for written documents.
pub const DEFAULT_EXTENSION: &str = ".covjson";
