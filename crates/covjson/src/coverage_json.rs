//! CoverageJSON document model.
//!
//! A [`Coverage`] combines a gridded [`Domain`], per-variable [`Parameter`]
//! metadata, the data [`Range`]s and the reference systems the domain axes
//! are expressed in.
//!
//! See: <https://covjson.org/>

use indexmap::IndexMap;
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::error::{CovJsonError, CovJsonResult};
use crate::parameters::Parameter;
use crate::referencing::ReferenceSystemConnection;
use crate::source::{Axis, AxisSet};

/// A CoverageJSON document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coverage {
    /// Document type (always "Coverage").
    #[serde(rename = "type")]
    pub type_: CoverageType,

    /// The coordinate grid.
    pub domain: Domain,

    /// Parameter definitions keyed by variable name.
    pub parameters: IndexMap<String, Parameter>,

    /// Data ranges keyed by variable name.
    pub ranges: IndexMap<String, Range>,

    /// Reference systems for the domain axes.
    pub referencing: Vec<ReferenceSystemConnection>,
}

impl Coverage {
    /// Assemble a coverage from its parts.
    pub fn new(
        domain: Domain,
        parameters: IndexMap<String, Parameter>,
        ranges: IndexMap<String, Range>,
        referencing: Vec<ReferenceSystemConnection>,
    ) -> Self {
        Self {
            type_: CoverageType::Coverage,
            domain,
            parameters,
            ranges,
            referencing,
        }
    }

    /// Variables that have a range but no parameter entry.
    pub fn unmatched_ranges(&self) -> Vec<&str> {
        self.ranges
            .keys()
            .filter(|name| !self.parameters.contains_key(*name))
            .map(String::as_str)
            .collect()
    }
}

/// Coverage type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CoverageType {
    /// Single coverage.
    Coverage,
}

/// The domain of a coverage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Domain {
    /// Domain type (always "Domain").
    #[serde(rename = "type")]
    pub type_: String,

    /// The domain type.
    #[serde(rename = "domainType")]
    pub domain_type: DomainType,

    /// Axis definitions.
    pub axes: DomainAxes,
}

impl Domain {
    /// Create a grid domain.
    pub fn grid(
        x_values: Vec<f64>,
        y_values: Vec<f64>,
        z_values: Option<Vec<f64>>,
        t_values: Option<Vec<AxisValue>>,
    ) -> Self {
        Self {
            type_: "Domain".to_string(),
            domain_type: DomainType::Grid,
            axes: DomainAxes {
                x: DomainAxis::floats(x_values),
                y: DomainAxis::floats(y_values),
                z: z_values.map(DomainAxis::floats),
                t: t_values.map(DomainAxis::new),
            },
        }
    }
}

/// Domain types supported by the writer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DomainType {
    /// Grid (2D or higher).
    Grid,
}

/// The axes of a grid domain. `z` and `t` are omitted when the dataset lacks them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainAxes {
    pub x: DomainAxis,
    pub y: DomainAxis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<DomainAxis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<DomainAxis>,
}

impl DomainAxes {
    /// Get an axis by key.
    pub fn get(&self, axis: Axis) -> Option<&DomainAxis> {
        match axis {
            Axis::X => Some(&self.x),
            Axis::Y => Some(&self.y),
            Axis::Z => self.z.as_ref(),
            Axis::T => self.t.as_ref(),
        }
    }

    /// The set of axes present.
    pub fn active(&self) -> AxisSet {
        Axis::ALL
            .into_iter()
            .filter(|axis| self.get(*axis).is_some())
            .fold(AxisSet::default(), AxisSet::with)
    }
}

/// An axis in the domain, as an explicit list of values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainAxis {
    pub values: Vec<AxisValue>,
}

impl DomainAxis {
    pub fn new(values: Vec<AxisValue>) -> Self {
        Self { values }
    }

    /// Create an axis of numeric coordinates.
    pub fn floats(values: Vec<f64>) -> Self {
        Self::new(values.into_iter().map(AxisValue::Float).collect())
    }

    /// Get the number of values in this axis.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if axis is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A value on an axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AxisValue {
    /// Floating-point value (coordinates, levels).
    Float(#[serde(serialize_with = "finite::serialize")] f64),
    /// String value (timestamps).
    String(String),
}

/// Numeric type tag of a range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    Float,
}

/// Largest magnitude below which every whole f64 is exact.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Flat row-major range values. Missing values are `null`.
///
/// Deserializing alone cannot tell `[null, null]` apart between the two
/// variants; [`NdArray`] settles it from its `dataType`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NdValues {
    Integer(Vec<Option<i64>>),
    Float(#[serde(serialize_with = "finite::serialize_seq")] Vec<Option<f64>>),
}

impl NdValues {
    /// Flatten an array in row-major order. NaN marks missing data.
    ///
    /// Integer arrays only stay integral when every present value is a
    /// whole number that f64 represents exactly; anything else is kept as
    /// floats.
    pub fn from_array(data_type: DataType, array: &ArrayD<f64>) -> Self {
        let integral = array.iter().all(|v| {
            v.is_nan() || (v.fract() == 0.0 && v.abs() <= MAX_EXACT_INTEGER)
        });

        match data_type {
            DataType::Integer if integral => NdValues::Integer(
                array
                    .iter()
                    .map(|v| (!v.is_nan()).then_some(*v as i64))
                    .collect(),
            ),
            _ => NdValues::Float(
                array
                    .iter()
                    .map(|v| (!v.is_nan()).then_some(*v))
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            NdValues::Integer(v) => v.len(),
            NdValues::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to the variant matching `data_type` where that is lossless.
    fn for_data_type(self, data_type: DataType) -> Self {
        match (data_type, self) {
            (DataType::Float, NdValues::Integer(v)) => {
                NdValues::Float(v.into_iter().map(|v| v.map(|v| v as f64)).collect())
            }
            (_, values) => values,
        }
    }

    /// Values as floats, for comparisons.
    pub fn to_f64(&self) -> Vec<Option<f64>> {
        match self {
            NdValues::Integer(v) => v.iter().map(|v| v.map(|v| v as f64)).collect(),
            NdValues::Float(v) => v.clone(),
        }
    }
}

/// A data range, either inline or split into tiles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Range {
    NdArray(NdArray),
    TiledNdArray(TiledNdArray),
}

impl Range {
    pub fn data_type(&self) -> DataType {
        match self {
            Range::NdArray(a) => a.data_type,
            Range::TiledNdArray(a) => a.data_type,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Range::NdArray(a) => &a.shape,
            Range::TiledNdArray(a) => &a.shape,
        }
    }

    pub fn axis_names(&self) -> &[String] {
        match self {
            Range::NdArray(a) => &a.axis_names,
            Range::TiledNdArray(a) => &a.axis_names,
        }
    }
}

/// N-dimensional array containing data values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "NdArrayFields")]
pub struct NdArray {
    /// Data type of values.
    #[serde(rename = "dataType")]
    pub data_type: DataType,

    /// Names of axes in order.
    #[serde(rename = "axisNames")]
    pub axis_names: Vec<String>,

    /// Shape of the array.
    pub shape: Vec<usize>,

    /// The data values in row-major order.
    pub values: NdValues,
}

impl NdArray {
    pub fn new(
        data_type: DataType,
        axis_names: Vec<String>,
        shape: Vec<usize>,
        values: NdValues,
    ) -> Self {
        Self {
            data_type,
            axis_names,
            shape,
            values,
        }
    }

    /// Check that axis names match the shape and the values fill it.
    pub fn validate(&self, variable: &str) -> CovJsonResult<()> {
        if self.axis_names.len() != self.shape.len() {
            return Err(CovJsonError::InvalidInput(format!(
                "'{}' has {} axis names for a {}-dimensional shape",
                variable,
                self.axis_names.len(),
                self.shape.len()
            )));
        }

        let expected: usize = self.shape.iter().product();
        if self.values.len() != expected {
            return Err(CovJsonError::ShapeMismatch {
                variable: variable.to_string(),
                shape: self.shape.clone(),
                expected,
                actual: self.values.len(),
            });
        }

        Ok(())
    }
}

#[derive(Deserialize)]
struct NdArrayFields {
    #[serde(rename = "dataType")]
    data_type: DataType,
    #[serde(rename = "axisNames")]
    axis_names: Vec<String>,
    shape: Vec<usize>,
    values: NdValues,
}

impl From<NdArrayFields> for NdArray {
    fn from(fields: NdArrayFields) -> Self {
        NdArray::new(
            fields.data_type,
            fields.axis_names,
            fields.shape,
            fields.values.for_data_type(fields.data_type),
        )
    }
}

/// N-dimensional array whose values live in separate tile documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TiledNdArray {
    #[serde(rename = "dataType")]
    pub data_type: DataType,

    #[serde(rename = "axisNames")]
    pub axis_names: Vec<String>,

    pub shape: Vec<usize>,

    /// One entry per tile, in the order the tiles were written.
    #[serde(rename = "tileSets")]
    pub tile_sets: Vec<TileSetEntry>,
}

/// Where one tile sits in the full array and the document holding it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TileSetEntry {
    /// Extent of the tile along each axis of the full array.
    #[serde(rename = "tileShape")]
    pub tile_shape: Vec<usize>,

    /// Index of the tile's first element along each axis.
    pub offset: Vec<usize>,

    /// URL of the tile document.
    pub url: String,
}

impl TileSetEntry {
    /// Whether the given multi-dimensional index falls inside this tile.
    pub fn contains(&self, index: &[usize]) -> bool {
        index.len() == self.offset.len()
            && index
                .iter()
                .zip(self.offset.iter().zip(&self.tile_shape))
                .all(|(i, (start, len))| *i >= *start && *i < start + len)
    }
}

impl TiledNdArray {
    /// URL of the tile containing the given index of the full array.
    pub fn url_for_index(&self, index: &[usize]) -> Option<&str> {
        self.tile_sets
            .iter()
            .find(|entry| entry.contains(index))
            .map(|entry| entry.url.as_str())
    }
}

/// Serializers that refuse numbers JSON cannot represent.
mod finite {
    use serde::ser::{Error, SerializeSeq, Serializer};

    fn non_finite(value: f64) -> String {
        format!("non-finite number {} has no JSON representation", value)
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            Err(S::Error::custom(non_finite(*value)))
        }
    }

    pub fn serialize_seq<S: Serializer>(
        values: &[Option<f64>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            match value {
                Some(v) if !v.is_finite() => return Err(S::Error::custom(non_finite(*v))),
                v => seq.serialize_element(v)?,
            }
        }
        seq.end()
    }
}
