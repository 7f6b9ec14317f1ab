//! Tests reading NetCDF files written on the fly.

use std::path::Path;

use covjson::{
    Axis, AxisSet, AxisValue, CovJsonError, CoverageWriter, DataSource, DataType, MemorySink,
    WriterConfig,
};
use netcdf_source::NetCdfSource;
use serde_json::Value;
use tempfile::TempDir;
use test_utils::{assert_approx_eq, require_test_file, time};

/// Write a small `time x lat x lon` file with packed and masked variables.
fn write_sample(path: &Path) {
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("time", 2).unwrap();
    file.add_dimension("lat", 2).unwrap();
    file.add_dimension("lon", 3).unwrap();

    {
        let mut var = file.add_variable::<f64>("time", &["time"]).unwrap();
        var.put_attribute("units", time::CF_HOURS_SINCE_REFERENCE).unwrap();
        var.put_attribute("standard_name", "time").unwrap();
        var.put_values(&[0.0, 6.0], ..).unwrap();
    }
    {
        let mut var = file.add_variable::<f64>("lat", &["lat"]).unwrap();
        var.put_attribute("units", "degrees_north").unwrap();
        var.put_values(&[35.0, 36.0], ..).unwrap();
    }
    {
        let mut var = file.add_variable::<f64>("lon", &["lon"]).unwrap();
        var.put_attribute("axis", "X").unwrap();
        var.put_values(&[-98.0, -97.0, -96.0], ..).unwrap();
    }
    {
        let mut var = file
            .add_variable::<f32>("sst", &["time", "lat", "lon"])
            .unwrap();
        var.put_attribute("units", "K").unwrap();
        var.put_attribute("standard_name", "sea_surface_temperature").unwrap();
        var.put_attribute("long_name", "Sea surface temperature").unwrap();
        var.put_attribute("missing_value", -999.0f64).unwrap();
        let values: Vec<f32> = vec![
            280.0, 281.0, 282.0, 283.0, -999.0, 285.0, //
            286.0, 287.0, 288.0, 289.0, 290.0, 291.0,
        ];
        var.put_values(&values, ..).unwrap();
    }
    {
        let mut var = file
            .add_variable::<i16>("packed", &["time", "lat", "lon"])
            .unwrap();
        var.put_attribute("scale_factor", 0.5f64).unwrap();
        var.put_attribute("add_offset", 100.0f64).unwrap();
        var.put_values(&[0i16, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22], ..)
            .unwrap();
    }
    {
        let mut var = file
            .add_variable::<i32>("count", &["lat", "lon"])
            .unwrap();
        var.put_values(&[1i32, 2, 3, 4, 5, 6], ..).unwrap();
    }
}

fn open_sample() -> (TempDir, NetCdfSource) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.nc");
    write_sample(&path);
    let source = NetCdfSource::open(&path).unwrap();
    (dir, source)
}

#[test]
fn test_detects_coordinates() {
    let (_dir, source) = open_sample();

    assert_eq!(source.axes(), AxisSet::horizontal().with(Axis::T));
    assert_eq!(source.coordinate(Axis::X), Some("lon"));
    assert_eq!(source.coordinate(Axis::Y), Some("lat"));
    assert_eq!(source.coordinate(Axis::T), Some("time"));
    assert_eq!(source.coordinate(Axis::Z), None);

    let mut variables = source.data_variables();
    variables.sort();
    assert_eq!(variables, vec!["count", "packed", "sst"]);
}

#[test]
fn test_axis_and_time_values() {
    let (_dir, source) = open_sample();

    assert_eq!(source.axis_values(Axis::X).unwrap(), vec![-98.0, -97.0, -96.0]);
    assert_eq!(source.axis_values(Axis::Y).unwrap(), vec![35.0, 36.0]);
    assert!(matches!(
        source.axis_values(Axis::Z),
        Err(CovJsonError::MissingAxis(_))
    ));

    assert_eq!(
        source.time_values().unwrap(),
        vec![
            AxisValue::String(time::REFERENCE_TIME.to_string()),
            AxisValue::String("2024-01-15T18:00:00Z".to_string()),
        ]
    );
}

#[test]
fn test_variable_metadata() {
    let (_dir, source) = open_sample();

    assert_eq!(source.shape("sst").unwrap(), vec![2, 2, 3]);
    assert_eq!(source.dimension_names("sst").unwrap(), vec!["t", "y", "x"]);
    assert_eq!(source.units("sst").as_deref(), Some("K"));
    assert_eq!(source.standard_name("sst").as_deref(), Some("sea_surface_temperature"));
    assert_eq!(source.long_name("sst").as_deref(), Some("Sea surface temperature"));
    assert_eq!(source.long_name("count"), None);

    assert_eq!(source.data_type("sst").unwrap(), DataType::Float);
    assert_eq!(source.data_type("packed").unwrap(), DataType::Float);
    assert_eq!(source.data_type("count").unwrap(), DataType::Integer);
}

#[test]
fn test_values_masked_and_unpacked() {
    let (_dir, source) = open_sample();

    let sst = source.values("sst").unwrap();
    assert_eq!(sst.shape(), &[2, 2, 3]);
    assert!(sst[[0, 1, 1]].is_nan());
    assert_approx_eq!(sst[[1, 1, 2]], 291.0, 1e-6);

    let packed = source.values("packed").unwrap();
    assert_approx_eq!(packed[[0, 0, 0]], 100.0, 1e-9);
    assert_approx_eq!(packed[[1, 1, 2]], 111.0, 1e-9);
}

#[test]
fn test_unknown_variable() {
    let (_dir, source) = open_sample();
    assert!(!source.has_variable("salinity"));
    assert!(matches!(
        source.values("salinity"),
        Err(CovJsonError::VariableNotFound(_))
    ));
}

#[test]
fn test_open_missing_file() {
    let err = NetCdfSource::open("/nonexistent/missing.nc").unwrap_err();
    assert!(err.to_string().contains("missing.nc"));
}

#[test]
fn test_write_coverage_from_netcdf() {
    let (_dir, source) = open_sample();
    let config = WriterConfig::new("coverage.covjson", vec!["sst".to_string(), "count".to_string()]);
    let mut sink = MemorySink::new();

    CoverageWriter::new(config, &source).write(&mut sink).unwrap();

    let document: Value = serde_json::from_str(sink.get("coverage.covjson").unwrap()).unwrap();
    assert_eq!(document["domain"]["axes"]["t"]["values"][0], time::REFERENCE_TIME);
    assert_eq!(document["ranges"]["sst"]["axisNames"], serde_json::json!(["t", "y", "x"]));
    assert!(document["ranges"]["sst"]["values"][4].is_null());
    assert_eq!(document["ranges"]["count"]["dataType"], "integer");
    assert_eq!(document["ranges"]["count"]["values"], serde_json::json!([1, 2, 3, 4, 5, 6]));
    assert_eq!(document["parameters"]["sst"]["unit"]["symbol"]["value"], "K");
    assert_eq!(document["referencing"].as_array().unwrap().len(), 2);
}

#[test]
fn test_real_sample_file() {
    let path = require_test_file!("sst_sample.nc");
    let source = NetCdfSource::open(&path).unwrap();

    assert!(source.axes().contains(Axis::X));
    assert!(source.axes().contains(Axis::Y));
    for variable in source.data_variables() {
        let shape = source.shape(&variable).unwrap();
        assert_eq!(shape.len(), source.dimension_names(&variable).unwrap().len());
    }
}
