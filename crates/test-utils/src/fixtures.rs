//! Common test fixtures for coverage tests.

/// Common grid specifications for testing.
pub mod grid {
    use crate::generators::axis_values;

    /// The 4x3 grid used in the end-to-end temperature scenario.
    pub const SMALL_4X3: GridSpec = GridSpec {
        width: 4,
        height: 3,
        min_x: -97.5,
        step_x: 0.1,
        min_y: 35.0,
        step_y: 0.1,
    };

    /// Simple 10x10 test grid
    pub const SIMPLE_10X10: GridSpec = GridSpec {
        width: 10,
        height: 10,
        min_x: -10.0,
        step_x: 2.0,
        min_y: -10.0,
        step_y: 2.0,
    };

    /// Global 1 degree grid
    pub const GLOBAL_1DEG: GridSpec = GridSpec {
        width: 360,
        height: 181,
        min_x: -180.0,
        step_x: 1.0,
        min_y: -90.0,
        step_y: 1.0,
    };

    /// Grid specification for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub min_x: f64,
        pub step_x: f64,
        pub min_y: f64,
        pub step_y: f64,
    }

    impl GridSpec {
        /// Returns the total number of grid cells.
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        /// Returns the array shape `[height, width]`.
        pub fn shape(&self) -> [usize; 2] {
            [self.height, self.width]
        }

        pub fn x_values(&self) -> Vec<f64> {
            axis_values(self.min_x, self.step_x, self.width)
        }

        pub fn y_values(&self) -> Vec<f64> {
            axis_values(self.min_y, self.step_y, self.height)
        }
    }
}

/// Common time values for testing.
pub mod time {
    /// A fixed reference time for tests (2024-01-15T12:00:00Z)
    pub const REFERENCE_TIME: &str = "2024-01-15T12:00:00Z";

    /// CF units string matching [`REFERENCE_TIME`] at offset 0.
    pub const CF_HOURS_SINCE_REFERENCE: &str = "hours since 2024-01-15 12:00:00";
}

/// Variable names used across tests.
pub mod variables {
    pub const TEMPERATURE: &str = "temperature";
    pub const SST: &str = "sst";
    pub const CHLOROPHYLL: &str = "chlor_a";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_spec_size() {
        assert_eq!(grid::GLOBAL_1DEG.size(), 360 * 181);
        assert_eq!(grid::SIMPLE_10X10.size(), 100);
    }

    #[test]
    fn test_grid_spec_axes() {
        let spec = grid::SMALL_4X3;
        assert_eq!(spec.shape(), [3, 4]);
        assert_eq!(spec.x_values().len(), 4);
        assert_eq!(spec.y_values().len(), 3);
        assert_eq!(grid::GLOBAL_1DEG.y_values().last(), Some(&90.0));
    }
}
