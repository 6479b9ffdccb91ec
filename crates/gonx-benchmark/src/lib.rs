//! Benchmark batches for gonx.
//!
//! A [`BenchmarkOrchestrator`] runs one [`Operation`] (bundle size, build,
//! lint or test time) over a list of projects:
//! - subjects run strictly one after another, each `runs` times
//! - the build tool cache is reset according to the [`ResetPolicy`]
//! - progress is streamed as [`ProgressEvent`]s over a bounded channel
//! - each subject's aggregate is appended to its analyser's history file
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gonx_benchmark::{BenchmarkConfig, BenchmarkOrchestrator, Operation};
//! use gonx_models::AnalyserKind;
//! use gonx_nx::NxCli;
//!
//! # async fn example(workspace: gonx_models::Workspace) -> Result<(), Box<dyn std::error::Error>> {
//! let root = std::env::current_dir()?;
//! let client = Arc::new(NxCli::new(&root)?);
//! let orchestrator = BenchmarkOrchestrator::new(
//!     client,
//!     Operation::new(AnalyserKind::Build),
//!     BenchmarkConfig::new(&root),
//! );
//!
//! let mut batch = orchestrator.run(workspace.applications.clone(), "baseline", 3);
//! while let Some(event) = batch.next_event().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod config;
pub mod error;
pub mod event;
pub mod operation;
pub mod orchestrator;
pub mod stats;

pub use config::BenchmarkConfig;
pub use error::{BenchmarkError, Result};
pub use event::ProgressEvent;
pub use operation::{Operation, ResetPolicy};
pub use orchestrator::{BatchHandle, BenchmarkOrchestrator};
pub use stats::aggregate;
