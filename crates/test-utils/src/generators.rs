//! Test data generators for synthetic gridded data.
//!
//! These generators create predictable, verifiable arrays and axes that can
//! be used across the test suite.

use ndarray::{ArrayD, IxDyn};

/// Creates an array whose values count up from 0 in row-major order.
///
/// Flattening the result gives `0.0, 1.0, 2.0, ...`, which makes it easy to
/// check that tiling and serialization keep element order.
///
/// # Example
///
/// ```
/// use test_utils::sequential_array;
///
/// let array = sequential_array(&[3, 4]);
/// assert_eq!(array.shape(), &[3, 4]);
/// assert_eq!(array[[2, 3]], 11.0);
/// ```
pub fn sequential_array(shape: &[usize]) -> ArrayD<f64> {
    let len: usize = shape.iter().product();
    let values = (0..len).map(|v| v as f64).collect();
    ArrayD::from_shape_vec(IxDyn(shape), values)
        .unwrap_or_else(|_| unreachable!("length matches shape"))
}

/// Creates a `[height, width]` grid where each cell is `col * 1000 + row`.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[[0, 1]], 1000.0); // row=0, col=1
/// assert_eq!(grid[[1, 0]], 1.0);    // row=1, col=0
/// ```
pub fn create_test_grid(width: usize, height: usize) -> ArrayD<f64> {
    let mut values = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            values.push((col * 1000 + row) as f64);
        }
    }
    ArrayD::from_shape_vec(IxDyn(&[height, width]), values)
        .unwrap_or_else(|_| unreachable!("length matches shape"))
}

/// Creates a `[times, height, width]` stack of temperature-like values in Kelvin.
///
/// Values form a gradient from about 250K to 310K that warms by 1K per step.
pub fn create_temperature_cube(times: usize, width: usize, height: usize) -> ArrayD<f64> {
    let mut values = Vec::with_capacity(times * width * height);
    for step in 0..times {
        for row in 0..height {
            for col in 0..width {
                let x_factor = col as f64 / width.max(1) as f64;
                let y_factor = row as f64 / height.max(1) as f64;
                values.push(250.0 + x_factor * 30.0 + y_factor * 30.0 + step as f64);
            }
        }
    }
    ArrayD::from_shape_vec(IxDyn(&[times, height, width]), values)
        .unwrap_or_else(|_| unreachable!("length matches shape"))
}

/// Creates a sequential array with NaN at the given flat indices.
///
/// Useful for testing missing data handling.
pub fn create_array_with_nans(shape: &[usize], nan_indices: &[usize]) -> ArrayD<f64> {
    let mut array = sequential_array(shape);
    if let Some(values) = array.as_slice_mut() {
        for &index in nan_indices {
            if let Some(value) = values.get_mut(index) {
                *value = f64::NAN;
            }
        }
    }
    array
}

/// Evenly spaced axis values: `start, start + step, ...`.
///
/// # Example
///
/// ```
/// use test_utils::axis_values;
///
/// assert_eq!(axis_values(-10.0, 0.5, 3), vec![-10.0, -9.5, -9.0]);
/// ```
pub fn axis_values(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Hourly RFC 3339 timestamps starting at 2024-01-01T00:00:00Z.
///
/// Covers up to 28 days, which is enough for any test grid.
pub fn hourly_times(count: usize) -> Vec<String> {
    (0..count)
        .map(|hour| {
            format!(
                "2024-01-{:02}T{:02}:00:00Z",
                1 + (hour / 24) % 28,
                hour % 24
            )
        })
        .collect()
}
