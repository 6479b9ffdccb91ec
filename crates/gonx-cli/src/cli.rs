//! Command-line interface definition using clap.

use std::path::PathBuf;
use std::sync::OnceLock;

use clap::{Parser, Subcommand};
use gonx_benchmark::ResetPolicy;
use gonx_models::AnalyserKind;

/// "0.1.0 (abc1234, 2026-10-18)"
fn version_string() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| {
        format!(
            "{} ({}, {})",
            env!("CARGO_PKG_VERSION"),
            env!("GONX_GIT_HASH"),
            env!("GONX_BUILD_DATE")
        )
    })
}

/// gonx - benchmark the projects of an Nx monorepo
#[derive(Parser, Debug)]
#[command(name = "gonx")]
#[command(author, version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Workspace root (default: current directory)
    #[arg(short, long, env = "GONX_ROOT", global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the projects of the workspace
    Projects {
        /// Output format (table, json, brief)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Ignore the workspace cache and probe every project
        #[arg(long)]
        no_cache: bool,
    },

    /// Run a benchmark batch
    Bench {
        /// What to measure (bundle, build, lint, test)
        analyser: AnalyserKind,

        /// Projects to measure, in order
        projects: Vec<String>,

        /// Measure every eligible project
        #[arg(short, long, conflicts_with = "projects")]
        all: bool,

        /// Runs per project (bundle analysis always runs once)
        #[arg(short = 'n', long, default_value_t = 1)]
        runs: usize,

        /// Free-form label stored with each record
        #[arg(short, long, default_value = "")]
        description: String,

        /// When to run `nx reset` (never, once, subject, run)
        #[arg(long)]
        reset: Option<ResetPolicy>,
    },

    /// Show recorded benchmarks, most recent first
    History {
        /// Which history (bundle, build, lint, test)
        analyser: AnalyserKind,

        /// Keep records whose project or description contains this text
        #[arg(short, long, default_value = "")]
        search: String,

        /// Keep records of this project only
        #[arg(short, long)]
        project: Option<String>,

        /// Show at most this many records
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (table, json, brief)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Manage the workspace cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum CacheAction {
    /// Delete the cached project graph
    Clear,
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Brief,
}

impl Cli {
    /// Returns the workspace root, defaulting to the current directory.
    pub fn root(&self) -> std::io::Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir(),
        }
    }

    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
