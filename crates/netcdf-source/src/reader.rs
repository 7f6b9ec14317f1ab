//! NetCDF-backed [`DataSource`].

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Once;

use covjson::{Axis, AxisSet, AxisValue, CovJsonError, CovJsonResult, DataSource, DataType};
use ndarray::{ArrayD, IxDyn};
use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::AttributeValue;
use tracing::{debug, info, warn};

use crate::axes::{axis_from_name, classify_axis};
use crate::cf_time;
use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This function disables that output by calling
/// H5Eset_auto2 with null handlers. It only needs to be called once per process,
/// but is safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// An open NetCDF file read as a coverage source.
pub struct NetCdfSource {
    path: PathBuf,
    file: netcdf::File,
    coordinates: BTreeMap<Axis, String>,
}

impl std::fmt::Debug for NetCdfSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetCdfSource")
            .field("path", &self.path)
            .field("coordinates", &self.coordinates)
            .finish()
    }
}

impl NetCdfSource {
    /// Open a file and detect its coordinate variables.
    pub fn open(path: impl AsRef<Path>) -> NetCdfResult<Self> {
        silence_hdf5_errors();

        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(NetCdfError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        let file = netcdf::open(&path)?;
        let coordinates = detect_coordinates(&file);

        info!(
            path = %path.display(),
            coordinates = ?coordinates,
            "Opened NetCDF source"
        );

        Ok(Self {
            path,
            file,
            coordinates,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the coordinate variable detected for an axis.
    pub fn coordinate(&self, axis: Axis) -> Option<&str> {
        self.coordinates.get(&axis).map(String::as_str)
    }

    /// Variables that are neither coordinates nor dimension variables.
    pub fn data_variables(&self) -> Vec<String> {
        let dimensions: HashSet<String> = self.file.dimensions().map(|d| d.name()).collect();
        self.file
            .variables()
            .map(|var| var.name())
            .filter(|name| {
                !dimensions.contains(name) && !self.coordinates.values().any(|c| c == name)
            })
            .collect()
    }

    fn variable(&self, name: &str) -> CovJsonResult<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| CovJsonError::VariableNotFound(name.to_string()))
    }

    fn coordinate_variable(&self, axis: Axis) -> CovJsonResult<netcdf::Variable<'_>> {
        let name = self
            .coordinate(axis)
            .ok_or_else(|| CovJsonError::MissingAxis(axis.to_string()))?;
        self.variable(name)
    }
}

impl DataSource for NetCdfSource {
    fn axes(&self) -> AxisSet {
        self.coordinates
            .keys()
            .fold(AxisSet::default(), |axes, axis| axes.with(*axis))
    }

    fn axis_values(&self, axis: Axis) -> CovJsonResult<Vec<f64>> {
        if axis == Axis::T {
            return Err(CovJsonError::InvalidInput(
                "time coordinates are read with time_values".to_string(),
            ));
        }
        let var = self.coordinate_variable(axis)?;
        Ok(read_unpacked(&var)?)
    }

    fn time_values(&self) -> CovJsonResult<Vec<AxisValue>> {
        let var = self.coordinate_variable(Axis::T)?;
        let raw = read_unpacked(&var)?;

        let units = get_str_attr(&var, "units");
        let calendar = get_str_attr(&var, "calendar");
        if let Some(decoded) = units
            .as_deref()
            .and_then(|u| cf_time::decode(&raw, u, calendar.as_deref()))
        {
            return Ok(decoded.into_iter().map(AxisValue::String).collect());
        }

        warn!(
            variable = %var.name(),
            units = ?units,
            calendar = ?calendar,
            "Time units not decodable, writing raw offsets"
        );
        Ok(raw.into_iter().map(AxisValue::Float).collect())
    }

    fn has_variable(&self, name: &str) -> bool {
        self.file.variable(name).is_some()
    }

    fn shape(&self, name: &str) -> CovJsonResult<Vec<usize>> {
        let var = self.variable(name)?;
        Ok(var.dimensions().iter().map(|d| d.len()).collect())
    }

    fn data_type(&self, name: &str) -> CovJsonResult<DataType> {
        let var = self.variable(name)?;
        match var.vartype() {
            // Packed integers unpack to floats
            NcVariableType::Int(_)
                if has_attr(&var, "scale_factor") || has_attr(&var, "add_offset") =>
            {
                Ok(DataType::Float)
            }
            NcVariableType::Int(_) => Ok(DataType::Integer),
            NcVariableType::Float(_) => Ok(DataType::Float),
            other => Err(NetCdfError::UnsupportedType {
                variable: name.to_string(),
                vartype: format!("{:?}", other),
            }
            .into()),
        }
    }

    fn values(&self, name: &str) -> CovJsonResult<ArrayD<f64>> {
        let var = self.variable(name)?;
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let values = read_unpacked(&var)?;
        debug!(variable = name, shape = ?shape, count = values.len(), "Read variable");

        // A count that does not fill the shape is reported by the range builder
        let expected: usize = shape.iter().product();
        let dims = if values.len() == expected {
            IxDyn(&shape)
        } else {
            IxDyn(&[values.len()])
        };
        ArrayD::from_shape_vec(dims, values)
            .map_err(|e| CovJsonError::InvalidInput(format!("'{}': {}", name, e)))
    }

    fn dimension_names(&self, name: &str) -> CovJsonResult<Vec<String>> {
        let var = self.variable(name)?;
        Ok(var
            .dimensions()
            .iter()
            .map(|dim| {
                let dim_name = dim.name();
                self.coordinates
                    .iter()
                    .find(|(_, coordinate)| **coordinate == dim_name)
                    .map(|(axis, _)| *axis)
                    .or_else(|| axis_from_name(&dim_name))
                    .map(|axis| axis.key().to_string())
                    .unwrap_or_else(|| dim_name.to_lowercase())
            })
            .collect())
    }

    fn standard_name(&self, name: &str) -> Option<String> {
        get_str_attr(&self.file.variable(name)?, "standard_name")
    }

    fn units(&self, name: &str) -> Option<String> {
        get_str_attr(&self.file.variable(name)?, "units")
    }

    fn long_name(&self, name: &str) -> Option<String> {
        get_str_attr(&self.file.variable(name)?, "long_name")
    }
}

/// Find one coordinate variable per axis.
///
/// Dimension variables are preferred; other variables of rank 2 or less are
/// considered when no dimension variable matches.
fn detect_coordinates(file: &netcdf::File) -> BTreeMap<Axis, String> {
    let dimensions: HashSet<String> = file.dimensions().map(|d| d.name()).collect();
    let mut coordinates = BTreeMap::new();

    for dimension_variables in [true, false] {
        for var in file.variables() {
            let name = var.name();
            if dimensions.contains(&name) != dimension_variables || var.dimensions().len() > 2 {
                continue;
            }

            let axis_attr = get_str_attr(&var, "axis");
            let standard_name = get_str_attr(&var, "standard_name");
            if let Some(axis) = classify_axis(&name, axis_attr.as_deref(), standard_name.as_deref())
            {
                coordinates.entry(axis).or_insert(name);
            }
        }
    }

    coordinates
}

macro_rules! read_as_f64 {
    ($var:expr, $t:ty) => {{
        let values: Vec<$t> = $var.get_values(..)?;
        values.into_iter().map(|v| v as f64).collect::<Vec<f64>>()
    }};
}

/// Read every value as f64, without masking.
fn read_raw(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    let values = match var.vartype() {
        NcVariableType::Float(FloatType::F64) => read_as_f64!(var, f64),
        NcVariableType::Float(FloatType::F32) => read_as_f64!(var, f32),
        NcVariableType::Int(IntType::I64) => read_as_f64!(var, i64),
        NcVariableType::Int(IntType::I32) => read_as_f64!(var, i32),
        NcVariableType::Int(IntType::I16) => read_as_f64!(var, i16),
        NcVariableType::Int(IntType::I8) => read_as_f64!(var, i8),
        NcVariableType::Int(IntType::U64) => read_as_f64!(var, u64),
        NcVariableType::Int(IntType::U32) => read_as_f64!(var, u32),
        NcVariableType::Int(IntType::U16) => read_as_f64!(var, u16),
        NcVariableType::Int(IntType::U8) => read_as_f64!(var, u8),
        other => {
            return Err(NetCdfError::UnsupportedType {
                variable: var.name(),
                vartype: format!("{:?}", other),
            })
        }
    };
    Ok(values)
}

/// Read values with fill and missing values masked to NaN, then unpacked
/// with `scale_factor` and `add_offset`.
fn read_unpacked(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    let raw = read_raw(var)?;

    let fill_value = get_f64_attr(var, "_FillValue");
    let missing_value = get_f64_attr(var, "missing_value");
    let scale_factor = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);

    Ok(raw
        .into_iter()
        .map(|v| {
            if v.is_nan() || Some(v) == fill_value || Some(v) == missing_value {
                f64::NAN
            } else {
                v * scale_factor + add_offset
            }
        })
        .collect())
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f64 attribute.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Helper to get string attribute.
fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        AttributeValue::Strs(strs) => strs.into_iter().next(),
        _ => None,
    }
}
