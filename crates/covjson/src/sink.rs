//! Destinations for rendered documents.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{CovJsonError, CovJsonResult};

/// Something documents can be written to.
pub trait OutputSink {
    /// Create or overwrite the document at `path` with `text`.
    fn write(&mut self, path: &str, text: &str) -> CovJsonResult<()>;
}

/// Writes documents as files below a root directory.
///
/// Each document is written to a temporary file next to its destination
/// and renamed into place, so a failed write never leaves a truncated file.
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Sink resolving paths against the working directory.
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute or root-relative location of a document.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl OutputSink for FileSink {
    fn write(&mut self, path: &str, text: &str) -> CovJsonResult<()> {
        let target = self.resolve(path);
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        std::fs::create_dir_all(&dir).map_err(|e| CovJsonError::io(&dir, e))?;

        let mut file = NamedTempFile::new_in(&dir).map_err(|e| CovJsonError::io(&dir, e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| CovJsonError::io(file.path(), e))?;
        file.persist(&target)
            .map_err(|e| CovJsonError::io(&target, e.error))?;

        debug!(path = %target.display(), bytes = text.len(), "Wrote document");
        Ok(())
    }
}

/// Collects documents in memory, in write order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    documents: Vec<(String, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent document written to `path`.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.documents
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, text)| text.as_str())
    }

    /// Paths in write order.
    pub fn paths(&self) -> Vec<&str> {
        self.documents.iter().map(|(p, _)| p.as_str()).collect()
    }

    pub fn documents(&self) -> &[(String, String)] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, path: &str, text: &str) -> CovJsonResult<()> {
        self.documents.push((path.to_string(), text.to_string()));
        Ok(())
    }
}
