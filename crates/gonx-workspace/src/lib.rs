//! Workspace discovery for gonx.
//!
//! [`WorkspaceResolver::resolve`] turns the build tool's project list into a
//! [`Workspace`](gonx_models::Workspace):
//!
//! 1. A fresh on-disk [`CacheSnapshot`] short-circuits everything except one
//!    `list_projects` call.
//! 2. Otherwise names are partitioned by pattern (`*.e2e` dropped, `*-e2e*`
//!    classified locally) and the rest are probed concurrently under a fixed
//!    bound.
//! 3. Probe failures drop the project; only a failing project list is fatal.
//! 4. The result is written back as a new snapshot, best effort.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gonx_nx::NxCli;
//! use gonx_workspace::{ResolverConfig, WorkspaceResolver};
//!
//! # async fn example() -> gonx_workspace::Result<()> {
//! let root = std::env::current_dir()?;
//! let client = Arc::new(NxCli::new(&root)?);
//! let resolver = WorkspaceResolver::new(&root, client, ResolverConfig::new(&root));
//! let workspace = resolver.resolve().await?;
//! println!("{} applications", workspace.applications.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod partition;
pub mod resolver;

pub use cache::{CacheMetadata, CacheSnapshot, CacheStatus, CacheStore};
pub use config::ResolverConfig;
pub use error::{Result, WorkspaceError};
pub use partition::{partition_names, PartitionedNames};
pub use resolver::WorkspaceResolver;
