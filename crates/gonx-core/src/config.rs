//! Shared configuration for gonx.
//!
//! # Storage Structure
//!
//! All state is stored inside the workspace being benchmarked:
//!
//! ```text
//! <workspace root>/
//! └── .gonx/
//!     ├── workspace-cache.json     # Resolved project graph
//!     └── benchmarks/
//!         ├── bundle-benchmarks.json
//!         ├── build-benchmarks.json
//!         ├── lint-benchmarks.json
//!         └── test-benchmarks.json
//! ```
//!
//! # Environment Variables
//!
//! - `GONX_DIR`: Override the state folder (absolute, or relative to the root)
//! - `GONX_NX_BIN`: Override the build tool binary (default: `nx`)
//! - `GONX_PROBE_CONCURRENCY`: Maximum describe-project calls in flight

use std::path::{Path, PathBuf};

use tracing::warn;

/// Environment variable for a custom state folder.
pub const STATE_DIR_ENV: &str = "GONX_DIR";

/// Environment variable for the build tool binary.
pub const NX_BIN_ENV: &str = "GONX_NX_BIN";

/// Environment variable for the probe parallelism bound.
pub const PROBE_CONCURRENCY_ENV: &str = "GONX_PROBE_CONCURRENCY";

/// Default state folder name under the workspace root.
pub const DEFAULT_STATE_DIR: &str = ".gonx";

/// Default build tool binary.
pub const DEFAULT_NX_BIN: &str = "nx";

/// Default number of concurrent project probes.
pub const DEFAULT_PROBE_CONCURRENCY: usize = 10;

/// Environment passed to every build tool invocation.
///
/// The daemon keeps state between invocations, which skews timings.
pub const NX_CHILD_ENV: [(&str, &str); 1] = [("NX_DAEMON", "false")];

const BENCHMARKS_SUBDIR: &str = "benchmarks";
const CACHE_FILE: &str = "workspace-cache.json";

/// Get the gonx state folder for a workspace root.
///
/// The folder is determined by:
/// 1. `GONX_DIR` if set (relative values are joined onto `root`)
/// 2. `<root>/.gonx`
pub fn state_dir(root: &Path) -> PathBuf {
    match std::env::var(STATE_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => root.join(dir),
        _ => root.join(DEFAULT_STATE_DIR),
    }
}

/// Get the workspace cache file path.
pub fn cache_file(root: &Path) -> PathBuf {
    state_dir(root).join(CACHE_FILE)
}

/// Get the folder holding the benchmark history files.
pub fn benchmarks_dir(root: &Path) -> PathBuf {
    state_dir(root).join(BENCHMARKS_SUBDIR)
}

/// Get the build tool binary name or path.
pub fn nx_program() -> String {
    std::env::var(NX_BIN_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_NX_BIN.to_string())
}

/// Get the probe parallelism bound.
///
/// Invalid or zero values fall back to [`DEFAULT_PROBE_CONCURRENCY`].
pub fn probe_concurrency() -> usize {
    match std::env::var(PROBE_CONCURRENCY_ENV) {
        Ok(raw) => parse_concurrency(&raw).unwrap_or_else(|| {
            warn!(value = %raw, "ignoring invalid {}", PROBE_CONCURRENCY_ENV);
            DEFAULT_PROBE_CONCURRENCY
        }),
        Err(_) => DEFAULT_PROBE_CONCURRENCY,
    }
}

fn parse_concurrency(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

/// Ensure the state folder and the benchmarks folder exist.
///
/// # Errors
/// Returns an error if any directory cannot be created.
pub fn ensure_all_dirs(root: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(benchmarks_dir(root))
}
