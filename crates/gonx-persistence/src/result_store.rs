//! History files for completed benchmarks.

use std::path::{Path, PathBuf};

use gonx_models::{AnalyserKind, BenchmarkRecord};
use tracing::{debug, warn};

use crate::atomic::{atomic_write_json, read_json_array};
use crate::error::Result;

/// Manages the per-analyser benchmark history files.
///
/// ```text
/// base_path/
/// ├── bundle-benchmarks.json
/// ├── build-benchmarks.json
/// ├── lint-benchmarks.json
/// └── test-benchmarks.json
/// ```
///
/// Each file is a pretty-printed JSON array, most recent record first.
/// A single writer is assumed.
#[derive(Debug, Clone)]
pub struct ResultStore {
    base_path: PathBuf,
}

impl ResultStore {
    /// Creates a store rooted at the benchmarks folder.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Returns the benchmarks folder.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the history file of an analyser.
    pub fn path(&self, kind: AnalyserKind) -> PathBuf {
        self.base_path.join(kind.file_name())
    }

    /// Prepends a record to its analyser's history file.
    ///
    /// Existing entries are carried over verbatim, including ones this
    /// version cannot decode. The folder is created if absent.
    pub fn append(&self, record: &BenchmarkRecord) -> Result<()> {
        let path = self.path(record.kind());
        let existing = read_json_array(&path)?;

        let mut records = Vec::with_capacity(existing.len() + 1);
        records.push(serde_json::to_value(record)?);
        records.extend(existing);

        atomic_write_json(&path, &records)?;
        debug!(
            analyser = %record.kind(),
            subject = %record.subject_name(),
            total = records.len(),
            "benchmark record appended"
        );
        Ok(())
    }

    /// Loads every record of an analyser, most recent first.
    ///
    /// An absent or empty file yields an empty list. Entries that fail to
    /// decode are skipped with a warning.
    pub fn load_all(&self, kind: AnalyserKind) -> Result<Vec<BenchmarkRecord>> {
        let path = self.path(kind);
        let values = read_json_array(&path)?;

        let mut records = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            match BenchmarkRecord::from_value(kind, value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(path = %path.display(), index, error = %e, "skipping unreadable record");
                }
            }
        }

        Ok(records)
    }
}
