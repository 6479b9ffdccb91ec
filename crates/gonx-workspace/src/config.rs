//! Resolver configuration.

use std::path::{Path, PathBuf};

use gonx_core::config;

/// Configuration for the workspace resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum number of describe-project calls in flight.
    pub max_concurrent_probes: usize,
    /// Location of the cache snapshot.
    pub cache_path: PathBuf,
    /// Whether a fresh snapshot may be returned without probing.
    pub use_cache: bool,
}

impl ResolverConfig {
    /// Creates a config for the workspace at `root`, honouring the
    /// environment overrides in [`gonx_core::config`].
    pub fn new(root: &Path) -> Self {
        Self {
            max_concurrent_probes: config::probe_concurrency(),
            cache_path: config::cache_file(root),
            use_cache: true,
        }
    }

    /// Sets the probe parallelism bound. Zero is raised to one.
    pub fn with_max_concurrent_probes(mut self, max: usize) -> Self {
        self.max_concurrent_probes = max.max(1);
        self
    }

    /// Sets the cache snapshot location.
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    /// Enables or disables reading the cache. A new snapshot is written
    /// either way.
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }
}
