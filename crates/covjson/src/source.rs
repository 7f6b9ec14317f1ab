//! Read-only access to the arrays and metadata a coverage is built from.

use std::collections::HashMap;
use std::fmt;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::coverage_json::{AxisValue, DataType};
use crate::error::{CovJsonError, CovJsonResult};

/// A logical domain axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
    T,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::T];

    /// Key used for this axis in documents.
    pub fn key(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
            Axis::T => "t",
        }
    }

    /// Parse an axis key, case-insensitively.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            "t" => Some(Axis::T),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The set of axes a dataset defines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisSet {
    pub x: bool,
    pub y: bool,
    pub z: bool,
    pub t: bool,
}

impl AxisSet {
    /// x and y only.
    pub fn horizontal() -> Self {
        Self {
            x: true,
            y: true,
            ..Default::default()
        }
    }

    pub fn with(mut self, axis: Axis) -> Self {
        match axis {
            Axis::X => self.x = true,
            Axis::Y => self.y = true,
            Axis::Z => self.z = true,
            Axis::T => self.t = true,
        }
        self
    }

    pub fn contains(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::T => self.t,
        }
    }

    /// Present axes in x, y, z, t order.
    pub fn iter(&self) -> impl Iterator<Item = Axis> + '_ {
        Axis::ALL.into_iter().filter(|axis| self.contains(*axis))
    }
}

/// A dataset the coverage is read from.
///
/// Implementations are already open and are only read from. Missing data in
/// [`values`](DataSource::values) is encoded as NaN.
pub trait DataSource {
    /// Axes the dataset defines.
    fn axes(&self) -> AxisSet;

    /// Coordinate values of a spatial axis, flattened to one dimension.
    fn axis_values(&self, axis: Axis) -> CovJsonResult<Vec<f64>>;

    /// Coordinate values of the time axis.
    fn time_values(&self) -> CovJsonResult<Vec<AxisValue>>;

    fn has_variable(&self, name: &str) -> bool;

    /// Declared shape of a variable.
    fn shape(&self, name: &str) -> CovJsonResult<Vec<usize>>;

    fn data_type(&self, name: &str) -> CovJsonResult<DataType>;

    /// All values of a variable.
    fn values(&self, name: &str) -> CovJsonResult<ArrayD<f64>>;

    /// Names of the dimensions a variable is defined over, in order.
    fn dimension_names(&self, name: &str) -> CovJsonResult<Vec<String>>;

    fn standard_name(&self, name: &str) -> Option<String>;

    fn units(&self, name: &str) -> Option<String>;

    fn long_name(&self, name: &str) -> Option<String>;
}

/// A variable held in memory.
#[derive(Debug, Clone)]
pub struct MemoryVariable {
    pub data: ArrayD<f64>,
    pub data_type: DataType,
    pub dimensions: Vec<String>,
    /// Shape reported to callers when it should differ from `data`'s shape.
    pub declared_shape: Option<Vec<usize>>,
    pub standard_name: Option<String>,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

impl MemoryVariable {
    pub fn new(data: ArrayD<f64>, dimensions: &[&str]) -> Self {
        Self {
            data,
            data_type: DataType::Float,
            dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
            declared_shape: None,
            standard_name: None,
            units: None,
            long_name: None,
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_declared_shape(mut self, shape: Vec<usize>) -> Self {
        self.declared_shape = Some(shape);
        self
    }

    pub fn with_standard_name(mut self, name: impl Into<String>) -> Self {
        self.standard_name = Some(name.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_long_name(mut self, name: impl Into<String>) -> Self {
        self.long_name = Some(name.into());
        self
    }
}

/// An in-memory [`DataSource`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Option<Vec<f64>>,
    t: Option<Vec<AxisValue>>,
    variables: HashMap<String, MemoryVariable>,
}

impl MemorySource {
    /// Create a source with the horizontal axes.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn with_z(mut self, z: Vec<f64>) -> Self {
        self.z = Some(z);
        self
    }

    pub fn with_t(mut self, t: Vec<AxisValue>) -> Self {
        self.t = Some(t);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, variable: MemoryVariable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }

    fn variable(&self, name: &str) -> CovJsonResult<&MemoryVariable> {
        self.variables
            .get(name)
            .ok_or_else(|| CovJsonError::VariableNotFound(name.to_string()))
    }
}

impl DataSource for MemorySource {
    fn axes(&self) -> AxisSet {
        AxisSet {
            x: true,
            y: true,
            z: self.z.is_some(),
            t: self.t.is_some(),
        }
    }

    fn axis_values(&self, axis: Axis) -> CovJsonResult<Vec<f64>> {
        match axis {
            Axis::X => Ok(self.x.clone()),
            Axis::Y => Ok(self.y.clone()),
            Axis::Z => self
                .z
                .clone()
                .ok_or_else(|| CovJsonError::MissingAxis(axis.to_string())),
            Axis::T => Err(CovJsonError::InvalidInput(
                "time coordinates are read with time_values".to_string(),
            )),
        }
    }

    fn time_values(&self) -> CovJsonResult<Vec<AxisValue>> {
        self.t
            .clone()
            .ok_or_else(|| CovJsonError::MissingAxis(Axis::T.to_string()))
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    fn shape(&self, name: &str) -> CovJsonResult<Vec<usize>> {
        let variable = self.variable(name)?;
        Ok(variable
            .declared_shape
            .clone()
            .unwrap_or_else(|| variable.data.shape().to_vec()))
    }

    fn data_type(&self, name: &str) -> CovJsonResult<DataType> {
        Ok(self.variable(name)?.data_type)
    }

    fn values(&self, name: &str) -> CovJsonResult<ArrayD<f64>> {
        Ok(self.variable(name)?.data.clone())
    }

    fn dimension_names(&self, name: &str) -> CovJsonResult<Vec<String>> {
        Ok(self.variable(name)?.dimensions.clone())
    }

    fn standard_name(&self, name: &str) -> Option<String> {
        self.variables.get(name)?.standard_name.clone()
    }

    fn units(&self, name: &str) -> Option<String> {
        self.variables.get(name)?.units.clone()
    }

    fn long_name(&self, name: &str) -> Option<String> {
        self.variables.get(name)?.long_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn source() -> MemorySource {
        let data = ArrayD::from_shape_vec(IxDyn(&[2, 3]), (0..6).map(f64::from).collect()).unwrap();
        MemorySource::new(vec![0.0, 1.0, 2.0], vec![10.0, 20.0]).with_variable(
            "sst",
            MemoryVariable::new(data, &["Y", "X"])
                .with_units("K")
                .with_standard_name("sea_surface_temperature"),
        )
    }

    #[test]
    fn test_axis_keys() {
        assert_eq!(Axis::T.key(), "t");
        assert_eq!(Axis::from_key("Z"), Some(Axis::Z));
        assert_eq!(Axis::from_key("lat"), None);
        assert_eq!(Axis::X.to_string(), "x");
    }

    #[test]
    fn test_axis_set() {
        let axes = AxisSet::horizontal().with(Axis::T);
        assert!(axes.contains(Axis::X));
        assert!(!axes.contains(Axis::Z));
        assert_eq!(axes.iter().collect::<Vec<_>>(), vec![Axis::X, Axis::Y, Axis::T]);
    }

    #[test]
    fn test_memory_source_metadata() {
        let source = source();
        assert_eq!(source.axes(), AxisSet::horizontal());
        assert!(source.has_variable("sst"));
        assert_eq!(source.shape("sst").unwrap(), vec![2, 3]);
        assert_eq!(source.data_type("sst").unwrap(), DataType::Float);
        assert_eq!(source.units("sst"), Some("K".to_string()));
        assert_eq!(source.long_name("sst"), None);
        assert_eq!(source.dimension_names("sst").unwrap(), vec!["Y", "X"]);
    }

    #[test]
    fn test_memory_source_missing_variable() {
        let err = source().values("chlor_a").unwrap_err();
        assert!(matches!(err, CovJsonError::VariableNotFound(ref v) if v == "chlor_a"));
    }

    #[test]
    fn test_memory_source_missing_axes() {
        let source = source();
        assert!(matches!(
            source.axis_values(Axis::Z),
            Err(CovJsonError::MissingAxis(_))
        ));
        assert!(matches!(source.time_values(), Err(CovJsonError::MissingAxis(_))));
    }

    #[test]
    fn test_declared_shape_override() {
        let data = ArrayD::from_shape_vec(IxDyn(&[4]), vec![0.0; 4]).unwrap();
        let source = MemorySource::new(vec![0.0], vec![0.0])
            .with_variable("v", MemoryVariable::new(data, &["x"]).with_declared_shape(vec![5]));
        assert_eq!(source.shape("v").unwrap(), vec![5]);
        assert_eq!(source.values("v").unwrap().len(), 4);
    }
}
