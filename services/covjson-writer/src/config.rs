//! Writer run configuration.
//!
//! Settings are layered: an optional YAML file, then `COVJSON_*` environment
//! variables, then command-line flags.

use anyhow::{bail, Context, Result};
use covjson::config::parse_tile_shape;
use covjson::{TilingConfig, WriterConfig};
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding the tile base URL.
pub const ENV_BASE_URL: &str = "COVJSON_BASE_URL";
/// Environment variable overriding the tile shape, e.g. `64,64`.
pub const ENV_TILE_SHAPE: &str = "COVJSON_TILE_SHAPE";
/// Environment variable enabling the JSON-LD context.
pub const ENV_LINKED_DATA: &str = "COVJSON_LINKED_DATA";

/// Settings as read from a YAML file, before overrides.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Path of the main document.
    pub output: Option<String>,

    /// Variables to write.
    pub variables: Vec<String>,

    /// Split ranges into tile documents.
    pub tiled: bool,

    /// Tile extent along each non-time axis.
    pub tile_shape: Option<Vec<usize>>,

    /// Base URL tile documents are served from.
    pub base_url: Option<String>,

    /// Explicit tile URL template containing `{t}`.
    pub url_template: Option<String>,

    /// Attach a JSON-LD context.
    pub linked_data: bool,

    /// Axis cut one step per tile.
    pub time_axis: Option<String>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output: Option<String>,
    pub variables: Vec<String>,
    pub tiled: bool,
    pub tile_shape: Option<String>,
    pub base_url: Option<String>,
    pub linked_data: bool,
}

impl RunConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        Self::from_yaml_str(&content).with_context(|| format!("Failed to parse: {:?}", path))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = Some(base_url);
        }
        if let Some(shape) = lookup(ENV_TILE_SHAPE) {
            self.tile_shape = Some(
                parse_tile_shape(&shape).with_context(|| format!("Invalid {}", ENV_TILE_SHAPE))?,
            );
        }
        if let Some(flag) = lookup(ENV_LINKED_DATA) {
            self.linked_data = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    /// Apply command-line values on top.
    pub fn apply_overrides(&mut self, overrides: &Overrides) -> Result<()> {
        if let Some(output) = &overrides.output {
            self.output = Some(output.clone());
        }
        if !overrides.variables.is_empty() {
            self.variables = overrides.variables.clone();
        }
        if let Some(shape) = &overrides.tile_shape {
            self.tile_shape = Some(parse_tile_shape(shape).context("Invalid --tile-shape")?);
        }
        if let Some(base_url) = &overrides.base_url {
            self.base_url = Some(base_url.clone());
        }
        self.tiled |= overrides.tiled;
        self.linked_data |= overrides.linked_data;
        Ok(())
    }

    /// Build the validated writer configuration.
    pub fn into_writer_config(self) -> Result<WriterConfig> {
        let Some(output) = self.output else {
            bail!("No output path given (--output or `output` in the config file)");
        };

        let mut config = WriterConfig::new(output, self.variables).with_linked_data(self.linked_data);
        if let Some(time_axis) = self.time_axis {
            config = config.with_time_axis(time_axis);
        }

        if self.tiled {
            let Some(tile_shape) = self.tile_shape else {
                bail!("Tiled output needs a tile shape (--tile-shape or {})", ENV_TILE_SHAPE);
            };
            let mut tiling = TilingConfig::new(tile_shape);
            if let Some(base_url) = self.base_url {
                tiling = tiling.with_base_url(base_url);
            }
            if let Some(template) = self.url_template {
                tiling = tiling.with_url_template(template);
            }
            config = config.tiled(tiling);
        }

        config.validate()?;
        Ok(config)
    }
}
