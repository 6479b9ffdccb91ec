//! Error types for build tool invocations.

use thiserror::Error;

/// Errors that can occur while invoking the build tool.
#[derive(Error, Debug)]
pub enum NxError {
    /// Build tool binary not found.
    #[error("{0} not found in PATH")]
    NotFound(String),

    /// The child process could not be started.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command exited with a non-zero status.
    #[error("`{command}` failed ({status}):\n{output}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    /// The command output could not be parsed.
    #[error("failed to parse output of `{command}`: {reason}")]
    ParseError { command: String, reason: String },

    /// The command was cancelled and its process killed.
    #[error("`{0}` was cancelled")]
    Cancelled(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl NxError {
    /// Returns true if the error comes from cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, NxError::Cancelled(_))
    }
}

/// Result type alias for build tool operations.
pub type Result<T> = std::result::Result<T, NxError>;
