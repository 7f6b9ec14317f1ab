//! The write operation: build a coverage from a source and write it out.

use std::path::Path;
use std::time::Instant;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::builder::{
    assemble_coverage, build_domain, build_parameters, build_ranges, build_references,
    build_tiled_range,
};
use crate::config::{TilingConfig, WriterConfig};
use crate::coverage_json::Range;
use crate::error::{CovJsonError, CovJsonResult};
use crate::format::SelectiveSerializer;
use crate::linked_data::LinkedDataContext;
use crate::sink::OutputSink;
use crate::source::DataSource;
use crate::tiling::TileSet;

/// What a write produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Paths written, in order. The main document is always last.
    pub documents: Vec<String>,
    /// Number of tile documents among `documents`.
    pub tiles: usize,
    /// Total bytes written.
    pub bytes: usize,
}

impl WriteSummary {
    fn record(&mut self, path: String, bytes: usize) {
        self.documents.push(path);
        self.bytes += bytes;
    }

    /// Path of the main document.
    pub fn main_document(&self) -> Option<&str> {
        self.documents.last().map(String::as_str)
    }
}

/// Writes the configured variables of one data source.
pub struct CoverageWriter<'a> {
    config: WriterConfig,
    source: &'a dyn DataSource,
}

impl<'a> CoverageWriter<'a> {
    pub fn new(config: WriterConfig, source: &'a dyn DataSource) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Build the coverage and write every document to `sink`.
    ///
    /// In tiled mode the tile documents are written first, as they are cut,
    /// and the main document last. Any error stops the write; documents
    /// already written are left in place.
    pub fn write(&self, sink: &mut dyn OutputSink) -> CovJsonResult<WriteSummary> {
        let start = Instant::now();
        self.config.validate()?;

        let variables = &self.config.variables;
        if let Some(missing) = variables.iter().find(|v| !self.source.has_variable(v)) {
            return Err(CovJsonError::VariableNotFound(missing.clone()));
        }

        let referencing = build_references(self.source.axes())?;
        let domain = build_domain(self.source)?;
        let parameters = build_parameters(self.source, variables)?;

        let mut summary = WriteSummary::default();
        let ranges = match &self.config.tiling {
            Some(tiling) => self.write_tiles(tiling, sink, &mut summary)?,
            None => build_ranges(self.source, variables)?,
        };

        let coverage = assemble_coverage(domain, parameters, ranges, referencing);

        let mut serializer = SelectiveSerializer::new(&coverage)?;
        serializer.mark_domain().mark_referencing();
        if !self.config.is_tiled() {
            serializer.mark_ranges();
        }
        if self.config.linked_data {
            serializer.attach_context(&LinkedDataContext::schema_org());
        }
        let text = serializer.render()?;

        debug!(path = %self.config.output, "Writing main document");
        sink.write(&self.config.output, &text)?;
        summary.record(self.config.output.clone(), text.len());

        info!(
            output = %self.config.output,
            variables = ?variables,
            tiles = summary.tiles,
            bytes = summary.bytes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Coverage written"
        );

        Ok(summary)
    }

    /// Cut every variable into tiles, writing each tile as it is produced.
    fn write_tiles(
        &self,
        tiling: &TilingConfig,
        sink: &mut dyn OutputSink,
        summary: &mut WriteSummary,
    ) -> CovJsonResult<IndexMap<String, Range>> {
        let tile_set = tiling.tile_set(&self.config.time_axis)?;
        self.check_main_document_name(tiling, self.planned_tile_count(&tile_set)?)?;

        let mut ranges = IndexMap::with_capacity(self.config.variables.len());
        let mut next_number = 1;

        for variable in &self.config.variables {
            let tiled = build_tiled_range(
                self.source,
                variable,
                &tile_set,
                next_number,
                |number, range| {
                    let mut serializer = SelectiveSerializer::new(range)?;
                    serializer.mark_range_document();
                    let text = serializer.render()?;

                    let path = self.tile_path(tiling, number);
                    sink.write(&path, &text)?;
                    summary.record(path, text.len());
                    summary.tiles += 1;
                    Ok(())
                },
            )?;

            info!(
                variable = %variable,
                tiles = tiled.tile_sets.len(),
                first = next_number,
                "Wrote tiles"
            );

            next_number += tiled.tile_sets.len();
            ranges.insert(variable.clone(), Range::TiledNdArray(tiled));
        }

        Ok(ranges)
    }

    /// Number of tiles the configured variables will be cut into.
    fn planned_tile_count(&self, tile_set: &TileSet) -> CovJsonResult<usize> {
        self.config.variables.iter().try_fold(0, |count, variable| {
            let shape = self.source.shape(variable)?;
            let axis_names: Vec<String> = self
                .source
                .dimension_names(variable)?
                .iter()
                .map(|name| name.to_lowercase())
                .collect();
            Ok(count + tile_set.layout(&shape, &axis_names)?.tile_count())
        })
    }

    /// The main document must not share a name with any tile, since both
    /// live in the same directory.
    fn check_main_document_name(
        &self,
        tiling: &TilingConfig,
        tile_count: usize,
    ) -> CovJsonResult<()> {
        let Some(name) = Path::new(&self.config.output)
            .file_name()
            .and_then(|name| name.to_str())
        else {
            return Ok(());
        };

        let clash = name
            .strip_suffix(tiling.extension.as_str())
            .and_then(|stem| stem.parse::<usize>().ok())
            .filter(|number| {
                (1..=tile_count).contains(number) && tiling.tile_file_name(*number) == name
            });

        match clash {
            Some(number) => Err(CovJsonError::Config(format!(
                "main document '{}' has the same name as tile {}",
                self.config.output, number
            ))),
            None => Ok(()),
        }
    }

    /// Tile documents sit next to the main document.
    fn tile_path(&self, tiling: &TilingConfig, number: usize) -> String {
        let name = tiling.tile_file_name(number);
        match Path::new(&self.config.output).parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                dir.join(name).to_string_lossy().into_owned()
            }
            _ => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TilingConfig;
    use crate::coverage_json::AxisValue;
    use crate::sink::MemorySink;
    use crate::source::{MemorySource, MemoryVariable};
    use ndarray::{ArrayD, IxDyn};
    use serde_json::Value;

    fn grid(shape: &[usize]) -> ArrayD<f64> {
        let len = shape.iter().product::<usize>();
        ArrayD::from_shape_vec(IxDyn(shape), (0..len).map(|v| v as f64).collect()).unwrap()
    }

    fn timed_source() -> MemorySource {
        MemorySource::new(vec![0.0, 1.0], vec![0.0, 1.0])
            .with_t(vec![
                AxisValue::String("2024-01-01T00:00:00Z".to_string()),
                AxisValue::String("2024-01-01T06:00:00Z".to_string()),
            ])
            .with_variable("sst", MemoryVariable::new(grid(&[2, 2, 2]), &["t", "y", "x"]))
            .with_variable("chl", MemoryVariable::new(grid(&[2, 2, 2]), &["t", "y", "x"]))
    }

    #[test]
    fn test_write_unknown_variable_writes_nothing() {
        let source = timed_source();
        let config = WriterConfig::new("out.covjson", vec!["salinity".to_string()]);
        let mut sink = MemorySink::new();

        let err = CoverageWriter::new(config, &source).write(&mut sink).unwrap_err();
        assert!(matches!(err, CovJsonError::VariableNotFound(_)));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_write_invalid_config() {
        let source = timed_source();
        let config = WriterConfig::new("out.covjson", vec![]);
        let mut sink = MemorySink::new();
        assert!(matches!(
            CoverageWriter::new(config, &source).write(&mut sink),
            Err(CovJsonError::Config(_))
        ));
    }

    #[test]
    fn test_tile_numbers_continue_across_variables() {
        let source = timed_source();
        let config = WriterConfig::new(
            "out/coverage.covjson",
            vec!["sst".to_string(), "chl".to_string()],
        )
        .tiled(TilingConfig::new(vec![2, 2]));
        let mut sink = MemorySink::new();

        let summary = CoverageWriter::new(config, &source).write(&mut sink).unwrap();

        assert_eq!(summary.tiles, 4);
        assert_eq!(
            sink.paths(),
            vec![
                "out/1.covjson",
                "out/2.covjson",
                "out/3.covjson",
                "out/4.covjson",
                "out/coverage.covjson"
            ]
        );
        assert_eq!(summary.main_document(), Some("out/coverage.covjson"));

        let main: Value = serde_json::from_str(sink.get("out/coverage.covjson").unwrap()).unwrap();
        assert_eq!(
            main["ranges"]["chl"]["tileSets"][0]["url"],
            "http://localhost:8080/3.covjson"
        );
    }

    #[test]
    fn test_main_document_named_like_a_tile() {
        let source = timed_source();
        let config = WriterConfig::new("out/1.covjson", vec!["sst".to_string()])
            .tiled(TilingConfig::new(vec![2, 2]));
        let mut sink = MemorySink::new();

        let err = CoverageWriter::new(config, &source).write(&mut sink).unwrap_err();
        assert!(matches!(err, CovJsonError::Config(_)));
        assert!(sink.is_empty());

        // Past the last tile number there is nothing to overwrite
        let config = WriterConfig::new("out/3.covjson", vec!["sst".to_string()])
            .tiled(TilingConfig::new(vec![2, 2]));
        let mut sink = MemorySink::new();
        let summary = CoverageWriter::new(config, &source).write(&mut sink).unwrap();
        assert_eq!(sink.paths(), vec!["out/1.covjson", "out/2.covjson", "out/3.covjson"]);
        assert_eq!(summary.tiles, 2);
    }

    #[test]
    fn test_linked_data_context_first() {
        let source = timed_source();
        let config =
            WriterConfig::new("out.covjson", vec!["sst".to_string()]).with_linked_data(true);
        let mut sink = MemorySink::new();

        CoverageWriter::new(config, &source).write(&mut sink).unwrap();

        let text = sink.get("out.covjson").unwrap();
        assert!(text.starts_with("{\n  \"@context\": {"));
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["@context"]["domainType"], "http://schema.org/additionalType");
    }

    #[test]
    fn test_summary_bytes() {
        let source = timed_source();
        let config = WriterConfig::new("out.covjson", vec!["sst".to_string()]);
        let mut sink = MemorySink::new();

        let summary = CoverageWriter::new(config, &source).write(&mut sink).unwrap();
        assert_eq!(summary.documents, vec!["out.covjson"]);
        assert_eq!(summary.bytes, sink.get("out.covjson").unwrap().len());
        assert_eq!(summary.tiles, 0);
    }
}
