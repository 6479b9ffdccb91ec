//! Error types for workspace resolution.

use thiserror::Error;

/// Errors that abort a resolution.
///
/// Probe failures and cache write failures are not errors: they are logged
/// and resolution continues.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The project list could not be obtained.
    #[error("nx error: {0}")]
    Nx(#[from] gonx_nx::NxError),

    /// Cache file error.
    #[error("cache error: {0}")]
    Persistence(#[from] gonx_persistence::PersistenceError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for workspace operations.
pub type Result<T> = std::result::Result<T, WorkspaceError>;
