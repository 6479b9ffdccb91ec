//! Orchestrator configuration.

use std::path::{Path, PathBuf};

use gonx_core::config;

/// Where a batch reads build output and writes results.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Workspace root; output paths are relative to it.
    pub root: PathBuf,
    /// Folder holding the per-analyser result files.
    pub results_dir: PathBuf,
}

impl BenchmarkConfig {
    /// Creates a config for the workspace at `root` with results under the
    /// state folder.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            results_dir: config::benchmarks_dir(root),
        }
    }

    /// Sets the results folder.
    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config() {
        let config = BenchmarkConfig::new(Path::new("/repo"));
        assert_eq!(config.root, PathBuf::from("/repo"));
        assert!(config.results_dir.ends_with("benchmarks"));

        let config = config.with_results_dir("/tmp/results");
        assert_eq!(config.results_dir, PathBuf::from("/tmp/results"));
    }
}
