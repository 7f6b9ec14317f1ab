//! Builders assembling the parts of a coverage from a [`DataSource`].
//!
//! Each builder is a pure function of the source except
//! [`build_tiled_range`], which hands every tile to a caller-supplied
//! closure as soon as it is produced.

use indexmap::IndexMap;
use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use crate::coverage_json::{Coverage, Domain, NdArray, NdValues, Range, TileSetEntry, TiledNdArray};
use crate::error::{CovJsonError, CovJsonResult};
use crate::parameters::{Parameter, Unit};
use crate::referencing::{select_references, ReferenceSystemConnection};
use crate::source::{Axis, AxisSet, DataSource};
use crate::tiling::TileSet;

/// Build the grid domain.
///
/// x and y are always required; z and t are included when the source has
/// them. Axis lengths are not checked against any variable's shape.
pub fn build_domain(source: &dyn DataSource) -> CovJsonResult<Domain> {
    let axes = source.axes();
    for axis in [Axis::X, Axis::Y] {
        if !axes.contains(axis) {
            return Err(CovJsonError::MissingAxis(axis.to_string()));
        }
    }

    let x = non_empty(Axis::X, source.axis_values(Axis::X)?)?;
    let y = non_empty(Axis::Y, source.axis_values(Axis::Y)?)?;
    let z = if axes.z {
        Some(non_empty(Axis::Z, source.axis_values(Axis::Z)?)?)
    } else {
        None
    };
    let t = if axes.t {
        Some(non_empty(Axis::T, source.time_values()?)?)
    } else {
        None
    };

    debug!(
        x = x.len(),
        y = y.len(),
        z = z.as_ref().map(Vec::len),
        t = t.as_ref().map(Vec::len),
        "Built grid domain"
    );

    Ok(Domain::grid(x, y, z, t))
}

fn non_empty<T>(axis: Axis, values: Vec<T>) -> CovJsonResult<Vec<T>> {
    if values.is_empty() {
        return Err(CovJsonError::InvalidInput(format!(
            "axis '{}' has no coordinate values",
            axis
        )));
    }
    Ok(values)
}

/// Build the parameter describing one variable.
pub fn build_parameter(source: &dyn DataSource, variable: &str) -> CovJsonResult<Parameter> {
    if !source.has_variable(variable) {
        return Err(CovJsonError::VariableNotFound(variable.to_string()));
    }

    let standard_name = source.standard_name(variable);
    let label = source
        .long_name(variable)
        .or_else(|| standard_name.clone())
        .unwrap_or_else(|| variable.to_string());

    let mut parameter = Parameter::new(variable, label);
    if let Some(standard_name) = standard_name {
        parameter = parameter.with_description(standard_name);
    }
    if let Some(units) = source.units(variable) {
        parameter = parameter.with_unit(Unit::new(units.clone(), units));
    }

    Ok(parameter)
}

/// Build one parameter per variable, keyed by variable name.
pub fn build_parameters(
    source: &dyn DataSource,
    variables: &[String],
) -> CovJsonResult<IndexMap<String, Parameter>> {
    variables
        .iter()
        .map(|variable| Ok((variable.clone(), build_parameter(source, variable)?)))
        .collect()
}

/// Read a variable reshaped to its declared shape, with lower-cased axis names.
fn read_variable(
    source: &dyn DataSource,
    variable: &str,
) -> CovJsonResult<(Vec<String>, ArrayD<f64>)> {
    let shape = source.shape(variable)?;
    let axis_names: Vec<String> = source
        .dimension_names(variable)?
        .iter()
        .map(|name| name.to_lowercase())
        .collect();

    if axis_names.len() != shape.len() {
        return Err(CovJsonError::InvalidInput(format!(
            "'{}' has {} dimension names for shape {:?}",
            variable,
            axis_names.len(),
            shape
        )));
    }

    let array = source.values(variable)?;
    let expected: usize = shape.iter().product();
    if array.len() != expected {
        return Err(CovJsonError::ShapeMismatch {
            variable: variable.to_string(),
            shape,
            expected,
            actual: array.len(),
        });
    }

    let array = if array.shape() == shape.as_slice() {
        array
    } else {
        ArrayD::from_shape_vec(IxDyn(&shape), array.iter().copied().collect())
            .map_err(|e| CovJsonError::InvalidInput(format!("'{}': {}", variable, e)))?
    };

    Ok((axis_names, array))
}

/// Build the inline range of one variable.
pub fn build_range(source: &dyn DataSource, variable: &str) -> CovJsonResult<Range> {
    debug!(variable, "Constructing range");

    let data_type = source.data_type(variable)?;
    let (axis_names, array) = read_variable(source, variable)?;

    let nd_array = NdArray::new(
        data_type,
        axis_names,
        array.shape().to_vec(),
        NdValues::from_array(data_type, &array),
    );
    nd_array.validate(variable)?;

    Ok(Range::NdArray(nd_array))
}

/// Build one inline range per variable, keyed by variable name.
pub fn build_ranges(
    source: &dyn DataSource,
    variables: &[String],
) -> CovJsonResult<IndexMap<String, Range>> {
    variables
        .iter()
        .map(|variable| Ok((variable.clone(), build_range(source, variable)?)))
        .collect()
}

/// Build the tiled range of one variable.
///
/// Tiles are numbered from `first_number` upwards. Each tile is passed to
/// `emit` as a standalone `NdArray` range before the next one is cut; an
/// error from `emit` stops tiling and is returned unchanged.
pub fn build_tiled_range<F>(
    source: &dyn DataSource,
    variable: &str,
    tile_set: &TileSet,
    first_number: usize,
    mut emit: F,
) -> CovJsonResult<TiledNdArray>
where
    F: FnMut(usize, &Range) -> CovJsonResult<()>,
{
    let data_type = source.data_type(variable)?;
    let (axis_names, array) = read_variable(source, variable)?;

    let tiles = tile_set.tiles(array.view(), &axis_names)?;
    debug!(variable, tiles = tiles.len(), shape = ?array.shape(), "Tiling range");

    let mut tile_sets = Vec::with_capacity(tiles.len());
    for tile in tiles {
        let number = first_number + tile.index;

        let nd_array = NdArray::new(
            data_type,
            tile.axis_names,
            tile.values.shape().to_vec(),
            NdValues::from_array(data_type, &tile.values),
        );
        nd_array.validate(variable)?;
        emit(number, &Range::NdArray(nd_array))?;

        tile_sets.push(TileSetEntry {
            tile_shape: tile.shape,
            offset: tile.offset,
            url: tile_set.url_for(number),
        });
    }

    Ok(TiledNdArray {
        data_type,
        axis_names,
        shape: array.shape().to_vec(),
        tile_sets,
    })
}

/// Reference systems for the source's axes.
pub fn build_references(axes: AxisSet) -> CovJsonResult<Vec<ReferenceSystemConnection>> {
    select_references(axes)
}

/// Compose a coverage from its parts.
pub fn assemble_coverage(
    domain: Domain,
    parameters: IndexMap<String, Parameter>,
    ranges: IndexMap<String, Range>,
    referencing: Vec<ReferenceSystemConnection>,
) -> Coverage {
    Coverage::new(domain, parameters, ranges, referencing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage_json::{AxisValue, DataType};
    use crate::source::{MemorySource, MemoryVariable};

    fn grid(shape: &[usize]) -> ArrayD<f64> {
        let len = shape.iter().product::<usize>();
        ArrayD::from_shape_vec(IxDyn(shape), (0..len).map(|v| v as f64).collect()).unwrap()
    }

    fn source() -> MemorySource {
        MemorySource::new(vec![0.0, 1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0])
            .with_variable(
                "temperature",
                MemoryVariable::new(grid(&[3, 4]), &["Y", "X"])
                    .with_units("K")
                    .with_standard_name("air_temperature")
                    .with_long_name("Air temperature"),
            )
            .with_variable("mask", MemoryVariable::new(grid(&[3, 4]), &["y", "x"]))
    }

    #[test]
    fn test_build_domain_horizontal() {
        let domain = build_domain(&source()).unwrap();
        assert_eq!(domain.axes.x.len(), 4);
        assert_eq!(domain.axes.y.len(), 3);
        assert!(domain.axes.z.is_none());
        assert!(domain.axes.t.is_none());
    }

    #[test]
    fn test_build_domain_with_time() {
        let source = source().with_t(vec![
            AxisValue::String("2024-01-01T00:00:00Z".to_string()),
            AxisValue::String("2024-01-02T00:00:00Z".to_string()),
        ]);
        let domain = build_domain(&source).unwrap();
        assert_eq!(domain.axes.t.as_ref().map(|t| t.len()), Some(2));
    }

    #[test]
    fn test_build_domain_empty_axis() {
        let source = MemorySource::new(vec![], vec![1.0]);
        assert!(matches!(build_domain(&source), Err(CovJsonError::InvalidInput(_))));
    }

    #[test]
    fn test_build_parameter_metadata() {
        let parameter = build_parameter(&source(), "temperature").unwrap();
        assert_eq!(parameter.variable_name.as_deref(), Some("temperature"));
        assert_eq!(parameter.observed_property.label.text(), "Air temperature");
        assert_eq!(parameter.description.as_ref().map(|d| d.text()), Some("air_temperature"));
        assert_eq!(parameter.symbol(), Some("K"));
    }

    #[test]
    fn test_build_parameter_label_fallback() {
        let parameter = build_parameter(&source(), "mask").unwrap();
        assert_eq!(parameter.observed_property.label.text(), "mask");
        assert!(parameter.unit.is_none());
        assert!(parameter.description.is_none());
    }

    #[test]
    fn test_build_parameters_one_entry_per_variable() {
        let variables = vec!["temperature".to_string(), "mask".to_string()];
        let parameters = build_parameters(&source(), &variables).unwrap();
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters.keys().collect::<Vec<_>>(), vec!["temperature", "mask"]);

        let ranges = build_ranges(&source(), &variables).unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges.keys().collect::<Vec<_>>(), vec!["temperature", "mask"]);
    }

    #[test]
    fn test_build_parameter_unknown_variable() {
        assert!(matches!(
            build_parameter(&source(), "salinity"),
            Err(CovJsonError::VariableNotFound(_))
        ));
    }

    #[test]
    fn test_build_range_lowercases_axis_names() {
        let range = build_range(&source(), "temperature").unwrap();
        assert_eq!(range.axis_names(), &["y".to_string(), "x".to_string()]);
        assert_eq!(range.shape(), &[3, 4]);
        assert_eq!(range.data_type(), DataType::Float);

        let Range::NdArray(array) = range else {
            panic!("expected an inline range");
        };
        assert_eq!(array.values.len(), 12);
        assert_eq!(array.values.to_f64()[11], Some(11.0));
    }

    #[test]
    fn test_build_range_shape_mismatch() {
        let source = MemorySource::new(vec![0.0], vec![0.0]).with_variable(
            "broken",
            MemoryVariable::new(grid(&[11]), &["y", "x"]).with_declared_shape(vec![3, 4]),
        );
        assert!(matches!(
            build_range(&source, "broken"),
            Err(CovJsonError::ShapeMismatch { expected: 12, actual: 11, .. })
        ));
    }

    #[test]
    fn test_build_range_reshapes_flat_values() {
        let source = MemorySource::new(vec![0.0], vec![0.0]).with_variable(
            "flat",
            MemoryVariable::new(grid(&[6]), &["y", "x"]).with_declared_shape(vec![2, 3]),
        );
        let range = build_range(&source, "flat").unwrap();
        assert_eq!(range.shape(), &[2, 3]);
    }

    #[test]
    fn test_build_range_integer() {
        let source = MemorySource::new(vec![0.0], vec![0.0]).with_variable(
            "count",
            MemoryVariable::new(grid(&[2]), &["x"]).with_data_type(DataType::Integer),
        );
        let Range::NdArray(array) = build_range(&source, "count").unwrap() else {
            panic!("expected an inline range");
        };
        assert_eq!(array.values, NdValues::Integer(vec![Some(0), Some(1)]));
    }

    #[test]
    fn test_build_tiled_range_emits_tiles() {
        let source = MemorySource::new(vec![0.0, 1.0], vec![0.0, 1.0])
            .with_t(vec![AxisValue::Float(0.0), AxisValue::Float(1.0)])
            .with_variable("sst", MemoryVariable::new(grid(&[2, 2, 2]), &["t", "y", "x"]));
        let tile_set = TileSet::new(vec![2, 2], "http://localhost:8080/{t}.covjson").unwrap();

        let mut emitted = Vec::new();
        let tiled = build_tiled_range(&source, "sst", &tile_set, 1, |number, range| {
            emitted.push((number, range.clone()));
            Ok(())
        })
        .unwrap();

        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].0, 1);
        assert_eq!(emitted[1].0, 2);
        assert_eq!(emitted[1].1.shape(), &[2, 2]);

        assert_eq!(tiled.shape, vec![2, 2, 2]);
        assert_eq!(tiled.tile_sets.len(), 2);
        assert_eq!(tiled.tile_sets[1].offset, vec![1, 0, 0]);
        assert_eq!(tiled.tile_sets[1].url, "http://localhost:8080/2.covjson");
    }

    #[test]
    fn test_build_tiled_range_stops_on_emit_error() {
        let source = MemorySource::new(vec![0.0], vec![0.0])
            .with_variable("sst", MemoryVariable::new(grid(&[3, 1, 1]), &["t", "y", "x"]));
        let tile_set = TileSet::new(vec![1, 1], "{t}").unwrap();

        let mut calls = 0;
        let result = build_tiled_range(&source, "sst", &tile_set, 1, |_, _| {
            calls += 1;
            Err(CovJsonError::Serialization("disk full".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_assemble_coverage() {
        let source = source();
        let variables = vec!["temperature".to_string()];
        let coverage = assemble_coverage(
            build_domain(&source).unwrap(),
            build_parameters(&source, &variables).unwrap(),
            build_ranges(&source, &variables).unwrap(),
            build_references(source.axes()).unwrap(),
        );

        assert!(coverage.unmatched_ranges().is_empty());
        assert_eq!(coverage.referencing, vec![ReferenceSystemConnection::spatial_2d()]);
    }
}
