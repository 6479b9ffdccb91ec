//! Core data models for gonx.
//!
//! This crate provides the fundamental data types shared by the workspace
//! resolver, the benchmark orchestrator and the result store: projects,
//! workspaces and the persisted benchmark records.

pub mod benchmark;
pub mod ids;
pub mod project;

pub use benchmark::{
    AnalyserKind, BenchmarkRecord, BuildBenchmark, BuildStats, BundleBenchmark, InitialStats,
    LintBenchmark, ProjectBenchmark, RunStats, TestBenchmark,
};
pub use ids::BenchmarkId;
pub use project::{Project, ProjectKind, Workspace};
