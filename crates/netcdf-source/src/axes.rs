//! Recognition of coordinate variables.

use covjson::Axis;

/// Classify a variable as a coordinate axis.
///
/// Checked in order: the CF `axis` attribute, the `standard_name`, then
/// conventional variable names. Returns `None` for data variables.
pub fn classify_axis(
    name: &str,
    axis_attr: Option<&str>,
    standard_name: Option<&str>,
) -> Option<Axis> {
    if let Some(axis) = axis_attr.and_then(|a| Axis::from_key(a.trim())) {
        return Some(axis);
    }

    if let Some(axis) = standard_name.and_then(axis_from_standard_name) {
        return Some(axis);
    }

    axis_from_name(name)
}

fn axis_from_standard_name(standard_name: &str) -> Option<Axis> {
    match standard_name.trim() {
        "longitude" | "projection_x_coordinate" | "grid_longitude" => Some(Axis::X),
        "latitude" | "projection_y_coordinate" | "grid_latitude" => Some(Axis::Y),
        "time" => Some(Axis::T),
        "depth" | "height" | "altitude" | "air_pressure" | "model_level_number" => Some(Axis::Z),
        _ => None,
    }
}

/// Classify by conventional variable or dimension name.
pub fn axis_from_name(name: &str) -> Option<Axis> {
    match name.to_ascii_lowercase().as_str() {
        "lon" | "longitude" | "x" | "nav_lon" => Some(Axis::X),
        "lat" | "latitude" | "y" | "nav_lat" => Some(Axis::Y),
        "time" | "t" => Some(Axis::T),
        "depth" | "z" | "level" | "lev" | "height" | "altitude" => Some(Axis::Z),
        _ => None,
    }
}
