//! Coordinate reference system descriptors.
//!
//! Reference systems are dataset-wide: which ones a coverage carries
//! depends only on the axes present, never on the variables written.

use serde::{Deserialize, Serialize};

use crate::error::{CovJsonError, CovJsonResult};
use crate::source::{Axis, AxisSet};

/// WGS 84 longitude/latitude.
pub const CRS84: &str = "http://www.opengis.net/def/crs/OGC/1.3/CRS84";

/// WGS 84 longitude/latitude/ellipsoidal height.
pub const EPSG_4979: &str = "http://www.opengis.net/def/crs/EPSG/0/4979";

/// Connection between axes and their reference system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceSystemConnection {
    /// Axes that use this reference system.
    pub coordinates: Vec<String>,

    /// The reference system.
    pub system: ReferenceSystem,
}

impl ReferenceSystemConnection {
    /// Horizontal x/y referencing.
    pub fn spatial_2d() -> Self {
        Self {
            coordinates: vec![Axis::X.to_string(), Axis::Y.to_string()],
            system: ReferenceSystem::spatial_2d(),
        }
    }

    /// x/y/z referencing.
    pub fn spatial_3d() -> Self {
        Self {
            coordinates: vec![Axis::X.to_string(), Axis::Y.to_string(), Axis::Z.to_string()],
            system: ReferenceSystem::spatial_3d(),
        }
    }

    /// Time axis referencing.
    pub fn temporal() -> Self {
        Self {
            coordinates: vec![Axis::T.to_string()],
            system: ReferenceSystem::temporal(),
        }
    }
}

/// Reference system definitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ReferenceSystem {
    /// Geographic coordinate reference system.
    #[serde(rename = "GeographicCRS")]
    Geographic {
        /// CRS identifier URI.
        id: String,
    },

    /// Temporal reference system.
    #[serde(rename = "TemporalRS")]
    Temporal {
        /// Calendar system (e.g., "Gregorian").
        calendar: String,
    },
}

impl ReferenceSystem {
    pub fn spatial_2d() -> Self {
        ReferenceSystem::Geographic {
            id: CRS84.to_string(),
        }
    }

    pub fn spatial_3d() -> Self {
        ReferenceSystem::Geographic {
            id: EPSG_4979.to_string(),
        }
    }

    pub fn temporal() -> Self {
        ReferenceSystem::Temporal {
            calendar: "Gregorian".to_string(),
        }
    }
}

/// Pick the reference systems for a dataset's axes.
///
/// - `{x, y, z, t}`: temporal + 3D spatial
/// - `{x, y, t}`: temporal + 2D spatial
/// - `{x, y}`: 2D spatial
///
/// A vertical axis without a time axis matches no rule and is rejected.
pub fn select_references(axes: AxisSet) -> CovJsonResult<Vec<ReferenceSystemConnection>> {
    for axis in [Axis::X, Axis::Y] {
        if !axes.contains(axis) {
            return Err(CovJsonError::MissingAxis(axis.to_string()));
        }
    }

    match (axes.contains(Axis::T), axes.contains(Axis::Z)) {
        (true, true) => Ok(vec![
            ReferenceSystemConnection::temporal(),
            ReferenceSystemConnection::spatial_3d(),
        ]),
        (true, false) => Ok(vec![
            ReferenceSystemConnection::temporal(),
            ReferenceSystemConnection::spatial_2d(),
        ]),
        (false, false) => Ok(vec![ReferenceSystemConnection::spatial_2d()]),
        (false, true) => Err(CovJsonError::UnsupportedAxisCombination(
            "vertical axis present without a time axis".to_string(),
        )),
    }
}
