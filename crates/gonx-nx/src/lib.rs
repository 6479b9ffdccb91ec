//! Nx integration for gonx.
//!
//! Everything gonx knows about the external build orchestrator goes through
//! the [`NxClient`] trait:
//! - `list_projects` - names of every project in the workspace
//! - `describe_project` - project type, root and build output path
//! - `run` - a `build`/`lint`/`test`/`reset` invocation, timed and cancellable
//!
//! [`NxCli`] implements it by spawning the `nx` binary as a child process in
//! the workspace root. Non-zero exit codes become [`NxError::CommandFailed`]
//! with the combined output embedded.

pub mod cli;
pub mod client;
pub mod error;

pub use cli::NxCli;
pub use client::{parse_project_list, CommandOutcome, NxClient, NxCommand, ProjectDescription};
pub use error::{NxError, Result};

pub use tokio_util::sync::CancellationToken;
