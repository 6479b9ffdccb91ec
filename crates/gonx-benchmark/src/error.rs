//! Error types for the benchmark crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while measuring a subject.
///
/// None of these abort a batch on their own; the orchestrator reports them
/// as progress events.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// Build tool error.
    #[error("{0}")]
    Nx(#[from] gonx_nx::NxError),

    /// Result file error.
    #[error("failed to write stats: {0}")]
    Persistence(#[from] gonx_persistence::PersistenceError),

    /// The application declares no build output path.
    #[error("no output path declared for {0}")]
    MissingOutputPath(String),

    /// The declared build output directory does not exist.
    #[error("build output directory not found: {}", .0.display())]
    OutputNotFound(PathBuf),

    /// Every run of a subject failed.
    #[error("no successful runs for {0}")]
    NoSuccessfulRuns(String),

    /// The batch task panicked or was aborted.
    #[error("batch task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchmarkError>;
