//! Writer configuration.
//!
//! Everything a write needs is passed in explicitly; there are no global
//! URL templates or output locations.

use serde::{Deserialize, Serialize};

use crate::error::{CovJsonError, CovJsonResult};
use crate::source::Axis;
use crate::tiling::{TileSet, TILE_PLACEHOLDER};
use crate::DEFAULT_EXTENSION;

/// Configuration for one write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Path of the main document.
    pub output: String,

    /// Variables to write, in document order.
    pub variables: Vec<String>,

    /// Split ranges into tile documents.
    #[serde(default)]
    pub tiling: Option<TilingConfig>,

    /// Attach a JSON-LD context to the main document.
    #[serde(default)]
    pub linked_data: bool,

    /// Axis cut one step per tile.
    #[serde(default = "default_time_axis")]
    pub time_axis: String,
}

fn default_time_axis() -> String {
    Axis::T.to_string()
}

impl WriterConfig {
    pub fn new(output: impl Into<String>, variables: Vec<String>) -> Self {
        Self {
            output: output.into(),
            variables,
            tiling: None,
            linked_data: false,
            time_axis: default_time_axis(),
        }
    }

    /// Enable tiling.
    pub fn tiled(mut self, tiling: TilingConfig) -> Self {
        self.tiling = Some(tiling);
        self
    }

    pub fn with_linked_data(mut self, enabled: bool) -> Self {
        self.linked_data = enabled;
        self
    }

    pub fn with_time_axis(mut self, axis: impl Into<String>) -> Self {
        self.time_axis = axis.into();
        self
    }

    pub fn is_tiled(&self) -> bool {
        self.tiling.is_some()
    }

    /// Reject configurations that cannot produce output.
    pub fn validate(&self) -> CovJsonResult<()> {
        if self.output.trim().is_empty() {
            return Err(CovJsonError::Config("output path is empty".to_string()));
        }
        if self.variables.is_empty() {
            return Err(CovJsonError::Config("no variables requested".to_string()));
        }
        if let Some(name) = self.variables.iter().find(|v| v.trim().is_empty()) {
            return Err(CovJsonError::Config(format!("invalid variable name '{}'", name)));
        }
        if self.time_axis.is_empty() {
            return Err(CovJsonError::Config("time axis name is empty".to_string()));
        }
        if let Some(tiling) = &self.tiling {
            tiling.validate()?;
        }
        Ok(())
    }
}

/// Tiling parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilingConfig {
    /// Tile extent along each non-time axis.
    pub tile_shape: Vec<usize>,

    /// Base URL tile documents are served from.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Extension of tile documents.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Explicit URL template; defaults to `{base_url}/{t}{extension}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_template: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl TilingConfig {
    pub fn new(tile_shape: Vec<usize>) -> Self {
        Self {
            tile_shape,
            base_url: default_base_url(),
            extension: default_extension(),
            url_template: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = Some(template.into());
        self
    }

    /// The URL template in effect.
    pub fn url_template(&self) -> String {
        self.url_template
            .clone()
            .unwrap_or_else(|| TileSet::generate_url_template(&self.base_url, &self.extension))
    }

    /// Local file name of the tile with the given number.
    pub fn tile_file_name(&self, number: usize) -> String {
        format!("{}{}", number, self.extension)
    }

    /// Build the tile set for a write.
    pub fn tile_set(&self, time_axis: &str) -> CovJsonResult<TileSet> {
        Ok(TileSet::new(self.tile_shape.clone(), self.url_template())?.with_time_axis(time_axis))
    }

    pub fn validate(&self) -> CovJsonResult<()> {
        if self.tile_shape.is_empty() {
            return Err(CovJsonError::Config("tile shape is empty".to_string()));
        }
        if self.tile_shape.contains(&0) {
            return Err(CovJsonError::Config(format!(
                "tile shape {:?} has a zero extent",
                self.tile_shape
            )));
        }
        let template = self.url_template();
        if !template.contains(TILE_PLACEHOLDER) {
            return Err(CovJsonError::Config(format!(
                "URL template '{}' has no {} placeholder",
                template, TILE_PLACEHOLDER
            )));
        }
        Ok(())
    }
}

/// Parse a comma-separated tile shape such as `"2,2"`.
pub fn parse_tile_shape(text: &str) -> CovJsonResult<Vec<usize>> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>().map_err(|_| {
                CovJsonError::Config(format!("invalid tile extent '{}' in '{}'", part, text))
            })
        })
        .collect()
}
