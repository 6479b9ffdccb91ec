//! Bundle size measurement of a build output directory.

use std::fs;
use std::path::{Path, PathBuf};

use gonx_models::BuildStats;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{BenchmarkError, Result};

/// Extensions counted as static assets, lowercase without the dot.
const ASSET_EXTENSIONS: [&str; 12] = [
    "jpg", "jpeg", "png", "gif", "svg", "ico", "webp", "avif", "woff", "woff2", "ttf", "eot",
];

/// Size bucket of a top-level output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Main,
    Runtime,
    Polyfills,
    Lazy,
    Styles,
}

/// Classifies a top-level output file by name.
///
/// Only `.js` and `.css` files are bucketed; the first matching rule wins.
pub fn classify(file_name: &str) -> Option<Bucket> {
    let is_css = file_name.ends_with(".css");
    if !file_name.ends_with(".js") && !is_css {
        return None;
    }

    if file_name.starts_with("main") {
        Some(Bucket::Main)
    } else if file_name.starts_with("scripts") {
        Some(Bucket::Runtime)
    } else if file_name.starts_with("polyfills") {
        Some(Bucket::Polyfills)
    } else if file_name.contains("chunk") {
        Some(Bucket::Lazy)
    } else if is_css {
        Some(Bucket::Styles)
    } else {
        None
    }
}

/// Returns true if the file is a static asset.
pub fn is_asset(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ASSET_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Resolves the directory to measure for an output path.
///
/// Application builders that emit a `browser/` subfolder are measured there.
pub fn output_dir(root: &Path, output_path: &str) -> Result<PathBuf> {
    let base = root.join(output_path);
    let browser = base.join("browser");
    if browser.is_dir() {
        return Ok(browser);
    }
    if base.is_dir() {
        return Ok(base);
    }
    Err(BenchmarkError::OutputNotFound(base))
}

/// Measures the build output of an application.
pub fn measure(root: &Path, output_path: &str) -> Result<BuildStats> {
    let dir = output_dir(root, output_path)?;
    let mut stats = measure_dir(&dir)?;
    stats.compute_totals();
    debug!(
        dir = %dir.display(),
        initial = stats.initial.total,
        overall = stats.overall_total,
        "measured bundle"
    );
    Ok(stats)
}

/// Buckets the top-level files of `dir` and sums its assets recursively.
/// Totals are left for the caller.
fn measure_dir(dir: &Path) -> Result<BuildStats> {
    let mut stats = BuildStats {
        assets: assets_size(dir)?,
        ..Default::default()
    };

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(bucket) = classify(&name.to_string_lossy()) else {
            continue;
        };

        let size = metadata.len();
        match bucket {
            Bucket::Main => stats.initial.main += size,
            Bucket::Runtime => stats.initial.runtime += size,
            Bucket::Polyfills => stats.initial.polyfills += size,
            Bucket::Lazy => stats.lazy += size,
            Bucket::Styles => stats.styles += size,
        }
    }

    Ok(stats)
}

fn assets_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && is_asset(entry.path()) {
            total += entry.metadata().map_err(std::io::Error::from)?.len();
        }
    }
    Ok(total)
}
