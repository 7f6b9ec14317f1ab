//! Mixed-format JSON rendering.
//!
//! `serde_json` applies a single formatting policy to a whole document. To
//! keep large arrays on one line inside an otherwise indented document,
//! selected subvalues are swapped out for unique placeholder strings, the
//! document is pretty-printed, and each quoted placeholder is then replaced
//! by the subvalue rendered with its own formatter.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{CovJsonError, CovJsonResult};
use crate::linked_data::LinkedDataContext;

/// How a marked subvalue is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatMode {
    /// No whitespace at all: `[1,2,3]`.
    Compact,
    /// One line with default spacing: `["y", "x"]`.
    NoIndent,
}

impl FormatMode {
    /// Render a value in this mode.
    pub fn render(&self, value: &Value) -> CovJsonResult<String> {
        match self {
            FormatMode::Compact => Ok(serde_json::to_string(value)?),
            FormatMode::NoIndent => {
                let mut buf = Vec::new();
                let mut serializer = Serializer::with_formatter(&mut buf, SpacedFormatter);
                value.serialize(&mut serializer)?;
                String::from_utf8(buf).map_err(|e| CovJsonError::Serialization(e.to_string()))
            }
        }
    }
}

/// Single-line formatter writing `", "` between items and `": "` after keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// A subvalue pulled out of the document together with its format.
#[derive(Debug, Clone)]
struct Custom {
    value: Value,
    mode: FormatMode,
}

/// Serializer that indents a document while rendering marked fields inline.
///
/// The placeholder table lives only as long as one serializer and is consumed
/// by [`render`](SelectiveSerializer::render).
#[derive(Debug)]
pub struct SelectiveSerializer {
    root: Value,
    markers: Vec<(String, Custom)>,
}

impl SelectiveSerializer {
    /// Convert a document into its JSON tree.
    ///
    /// Non-finite numbers are rejected here, before anything is written.
    pub fn new<T: Serialize>(document: &T) -> CovJsonResult<Self> {
        let root = serde_json::to_value(document)?;
        Ok(Self {
            root,
            markers: Vec::new(),
        })
    }

    /// Render every domain axis's `values` compactly.
    pub fn mark_domain(&mut self) -> &mut Self {
        let Self { root, markers } = self;
        if let Some(axes) = root
            .pointer_mut("/domain/axes")
            .and_then(Value::as_object_mut)
        {
            for axis in axes.values_mut() {
                mark_field(axis, "values", FormatMode::Compact, markers);
            }
        }
        self
    }

    /// Keep every reference's `coordinates` on one line.
    pub fn mark_referencing(&mut self) -> &mut Self {
        let Self { root, markers } = self;
        if let Some(references) = root.get_mut("referencing").and_then(Value::as_array_mut) {
            for reference in references {
                mark_field(reference, "coordinates", FormatMode::NoIndent, markers);
            }
        }
        self
    }

    /// Mark the array fields of every entry under `ranges`.
    pub fn mark_ranges(&mut self) -> &mut Self {
        let Self { root, markers } = self;
        if let Some(ranges) = root.get_mut("ranges").and_then(Value::as_object_mut) {
            for range in ranges.values_mut() {
                mark_range(range, markers);
            }
        }
        self
    }

    /// Mark the array fields of a document that is itself a range.
    pub fn mark_range_document(&mut self) -> &mut Self {
        let Self { root, markers } = self;
        mark_range(root, markers);
        self
    }

    /// Insert a JSON-LD `@context` as the first member of the document.
    pub fn attach_context(&mut self, context: &LinkedDataContext) -> &mut Self {
        context.attach(&mut self.root);
        self
    }

    /// Number of subvalues awaiting substitution.
    pub fn marked(&self) -> usize {
        self.markers.len()
    }

    /// Pretty-print the document and substitute every placeholder.
    pub fn render(self) -> CovJsonResult<String> {
        let mut text = serde_json::to_string_pretty(&self.root)?;
        for (key, custom) in &self.markers {
            let placeholder = format!("\"{}\"", key);
            let rendered = custom.mode.render(&custom.value)?;
            text = text.replacen(&placeholder, &rendered, 1);
        }
        Ok(text)
    }
}

/// Mark `axisNames` and `shape` as no-indent, and `values` (when present) compact.
fn mark_range(range: &mut Value, markers: &mut Vec<(String, Custom)>) {
    mark_field(range, "axisNames", FormatMode::NoIndent, markers);
    mark_field(range, "shape", FormatMode::NoIndent, markers);
    mark_field(range, "values", FormatMode::Compact, markers);
}

/// Replace `object[key]` with a placeholder, recording the original value.
fn mark_field(
    object: &mut Value,
    key: &str,
    mode: FormatMode,
    markers: &mut Vec<(String, Custom)>,
) {
    let Some(slot) = object.get_mut(key) else {
        return;
    };

    let placeholder = format!("@@{}@@", Uuid::new_v4().simple());
    let value = std::mem::replace(slot, Value::String(placeholder.clone()));
    markers.push((placeholder, Custom { value, mode }));
}
