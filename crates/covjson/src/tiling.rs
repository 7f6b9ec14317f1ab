//! Partitioning of range arrays into tiles.
//!
//! The time axis is always cut one step per tile. Every other axis is cut
//! according to the tile shape, so an array of shape `[T, H, W]` with tile
//! shape `[H, W]` yields exactly `T` tiles. Tiles are produced time-major,
//! then row-major over the remaining tile grid; edge tiles may be smaller
//! than the tile shape.

use ndarray::{ArrayD, ArrayViewD, Axis as ArrayAxis, Slice};

use crate::error::{CovJsonError, CovJsonResult};
use crate::source::Axis;

/// Placeholder in URL templates replaced by the tile number.
pub const TILE_PLACEHOLDER: &str = "{t}";

/// A tiling scheme: tile extents plus the URL template naming each tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSet {
    tile_shape: Vec<usize>,
    url_template: String,
    time_axis: String,
}

impl TileSet {
    /// Create a tile set. `tile_shape` gives the extent of one tile along
    /// each non-time axis, in array order.
    pub fn new(tile_shape: Vec<usize>, url_template: impl Into<String>) -> CovJsonResult<Self> {
        if tile_shape.is_empty() {
            return Err(CovJsonError::InvalidTileShape {
                tile_shape,
                reason: "tile shape is empty".to_string(),
            });
        }
        if tile_shape.contains(&0) {
            return Err(CovJsonError::InvalidTileShape {
                tile_shape,
                reason: "tile extents must be positive".to_string(),
            });
        }
        let url_template = url_template.into();
        if !url_template.contains(TILE_PLACEHOLDER) {
            return Err(CovJsonError::Config(format!(
                "URL template '{}' has no {} placeholder",
                url_template, TILE_PLACEHOLDER
            )));
        }

        Ok(Self {
            tile_shape,
            url_template,
            time_axis: Axis::T.to_string(),
        })
    }

    /// Name the axis cut one step per tile. Defaults to `t`.
    pub fn with_time_axis(mut self, axis: impl Into<String>) -> Self {
        self.time_axis = axis.into();
        self
    }

    pub fn tile_shape(&self) -> &[usize] {
        &self.tile_shape
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn time_axis(&self) -> &str {
        &self.time_axis
    }

    /// Build a URL template of the form `{base_url}/{t}{extension}`.
    pub fn generate_url_template(base_url: &str, extension: &str) -> String {
        format!(
            "{}/{}{}",
            base_url.trim_end_matches('/'),
            TILE_PLACEHOLDER,
            extension
        )
    }

    /// URL of the tile with the given 1-based number.
    pub fn url_for(&self, number: usize) -> String {
        self.url_template
            .replace(TILE_PLACEHOLDER, &number.to_string())
    }

    /// Work out how an array of `shape` with `axis_names` splits into tiles.
    pub fn layout(&self, shape: &[usize], axis_names: &[String]) -> CovJsonResult<TileLayout> {
        if shape.len() != axis_names.len() {
            return Err(CovJsonError::InvalidInput(format!(
                "{} axis names for a {}-dimensional array",
                axis_names.len(),
                shape.len()
            )));
        }

        let time_index = axis_names.iter().position(|name| *name == self.time_axis);
        let tiled_axes = shape.len() - usize::from(time_index.is_some());
        if self.tile_shape.len() != tiled_axes {
            return Err(CovJsonError::InvalidTileShape {
                tile_shape: self.tile_shape.clone(),
                reason: format!(
                    "expected {} extents for array shape {:?} with axes {:?}",
                    tiled_axes, shape, axis_names
                ),
            });
        }

        let mut extents = self.tile_shape.iter();
        let tile_extents: Vec<usize> = (0..shape.len())
            .map(|axis| {
                if Some(axis) == time_index {
                    1
                } else {
                    // Lengths were checked above
                    extents.next().copied().unwrap_or(1)
                }
            })
            .collect();

        // Time axis outermost, remaining axes in array order
        let order: Vec<usize> = time_index
            .into_iter()
            .chain((0..shape.len()).filter(|axis| Some(*axis) != time_index))
            .collect();

        Ok(TileLayout {
            shape: shape.to_vec(),
            axis_names: axis_names.to_vec(),
            tile_extents,
            order,
            time_index,
        })
    }

    /// Iterate over the tiles of an array.
    ///
    /// The iterator borrows the array, so tiling the same array again starts
    /// over from the first tile.
    pub fn tiles<'a>(
        &self,
        array: ArrayViewD<'a, f64>,
        axis_names: &[String],
    ) -> CovJsonResult<Tiles<'a>> {
        let layout = self.layout(array.shape(), axis_names)?;
        Ok(Tiles {
            array,
            layout,
            next: 0,
        })
    }
}

/// How an array splits into tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayout {
    shape: Vec<usize>,
    axis_names: Vec<String>,
    tile_extents: Vec<usize>,
    order: Vec<usize>,
    time_index: Option<usize>,
}

impl TileLayout {
    /// Number of tiles along each array axis.
    pub fn grid(&self) -> Vec<usize> {
        self.shape
            .iter()
            .zip(&self.tile_extents)
            .map(|(len, tile)| len.div_ceil(*tile))
            .collect()
    }

    pub fn tile_count(&self) -> usize {
        self.grid().iter().product()
    }

    /// Extent of a full tile along each array axis (1 on the time axis).
    pub fn tile_extents(&self) -> &[usize] {
        &self.tile_extents
    }

    /// Position of the tile with the given sequence index, in array order.
    fn offset_of(&self, index: usize) -> Vec<usize> {
        let grid = self.grid();
        let mut offset = vec![0; self.shape.len()];
        let mut remainder = index;
        for &axis in self.order.iter().rev() {
            offset[axis] = (remainder % grid[axis]) * self.tile_extents[axis];
            remainder /= grid[axis];
        }
        offset
    }
}

/// One tile of an array.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// 0-based position in tile order.
    pub index: usize,
    /// First element of the tile along each axis of the full array.
    pub offset: Vec<usize>,
    /// Extent of the tile along each axis of the full array.
    pub shape: Vec<usize>,
    /// Axis names of `values`; the time axis is dropped.
    pub axis_names: Vec<String>,
    /// Tile values with the time axis dropped.
    pub values: ArrayD<f64>,
}

/// Iterator over the tiles of one array.
#[derive(Debug)]
pub struct Tiles<'a> {
    array: ArrayViewD<'a, f64>,
    layout: TileLayout,
    next: usize,
}

impl Tiles<'_> {
    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }
}

impl Iterator for Tiles<'_> {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        if self.next >= self.layout.tile_count() {
            return None;
        }

        let index = self.next;
        self.next += 1;

        let offset = self.layout.offset_of(index);
        let shape: Vec<usize> = offset
            .iter()
            .zip(&self.layout.tile_extents)
            .zip(&self.layout.shape)
            .map(|((start, extent), len)| (*extent).min(len - start))
            .collect();

        let mut view = self.array.slice_each_axis(|desc| {
            let axis = desc.axis.index();
            Slice::from(offset[axis]..offset[axis] + shape[axis])
        });

        let mut axis_names = self.layout.axis_names.clone();
        if let Some(time) = self.layout.time_index {
            view = view.index_axis_move(ArrayAxis(time), 0);
            axis_names.remove(time);
        }

        Some(Tile {
            index,
            offset,
            shape,
            axis_names,
            values: view.to_owned(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.layout.tile_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Tiles<'_> {}
