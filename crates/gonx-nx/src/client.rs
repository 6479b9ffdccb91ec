//! The build tool interface.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use gonx_models::ProjectKind;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::{NxError, Result};

/// A timed build tool sub-command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NxCommand {
    /// `build <project>`
    Build(String),
    /// `lint <project>`
    Lint(String),
    /// `test <project>`
    Test(String),
    /// `reset`, clearing the shared computation cache.
    Reset,
}

impl NxCommand {
    /// Arguments passed to the build tool binary.
    pub fn args(&self) -> Vec<String> {
        match self {
            NxCommand::Build(project) => vec!["build".to_string(), project.clone()],
            NxCommand::Lint(project) => vec!["lint".to_string(), project.clone()],
            NxCommand::Test(project) => vec!["test".to_string(), project.clone()],
            NxCommand::Reset => vec!["reset".to_string()],
        }
    }

    /// The project this command targets, if any.
    pub fn project(&self) -> Option<&str> {
        match self {
            NxCommand::Build(p) | NxCommand::Lint(p) | NxCommand::Test(p) => Some(p),
            NxCommand::Reset => None,
        }
    }
}

impl fmt::Display for NxCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nx {}", self.args().join(" "))
    }
}

/// Result of a successful command.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Wall-clock time from spawn to exit.
    pub duration: Duration,
    /// Combined stdout and stderr.
    pub output: String,
}

/// What `describe_project` reports about a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDescription {
    /// Classified kind. `None` for project types gonx does not benchmark.
    pub kind: Option<ProjectKind>,
    /// Project root relative to the workspace root.
    pub root: Option<String>,
    /// `targets.build.options.outputPath`.
    pub output_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProject {
    #[serde(default)]
    root: Option<String>,
    #[serde(rename = "projectType", default)]
    project_type: Option<String>,
    #[serde(default)]
    targets: RawTargets,
}

#[derive(Debug, Default, Deserialize)]
struct RawTargets {
    #[serde(default)]
    build: Option<RawTarget>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTarget {
    #[serde(default)]
    options: RawBuildOptions,
}

#[derive(Debug, Default, Deserialize)]
struct RawBuildOptions {
    #[serde(rename = "outputPath", default)]
    output_path: Option<serde_json::Value>,
}

impl ProjectDescription {
    /// Parses the JSON printed by `show project <name> --json`.
    pub fn parse(command: &str, json: &str) -> Result<Self> {
        let raw: RawProject =
            serde_json::from_str(json.trim()).map_err(|e| NxError::ParseError {
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        let kind = match raw.project_type.as_deref() {
            Some("application") => Some(ProjectKind::Application),
            Some("library") => Some(ProjectKind::Library),
            _ => None,
        };

        // Newer executors declare outputPath as an object ({ "base": ... }).
        let output_path = raw
            .targets
            .build
            .and_then(|t| t.options.output_path)
            .and_then(|v| match v {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Object(map) => map
                    .get("base")
                    .and_then(|b| b.as_str())
                    .map(str::to_string),
                _ => None,
            })
            .filter(|s| !s.is_empty());

        Ok(Self {
            kind,
            root: raw.root.filter(|r| !r.is_empty()),
            output_path,
        })
    }
}

/// Parses the newline-separated output of `show projects`.
///
/// Blank lines are ignored; order is preserved.
pub fn parse_project_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Interface to the external build orchestrator.
///
/// Implementations must be safe to call concurrently: the workspace
/// resolver issues many `describe_project` calls at once.
#[async_trait]
pub trait NxClient: Send + Sync {
    /// Lists the names of every project in the workspace.
    async fn list_projects(&self) -> Result<Vec<String>>;

    /// Describes a single project.
    async fn describe_project(&self, name: &str) -> Result<ProjectDescription>;

    /// Runs a timed sub-command.
    ///
    /// When `cancel` fires the child process is killed and
    /// [`NxError::Cancelled`] is returned.
    async fn run(&self, command: &NxCommand, cancel: &CancellationToken)
        -> Result<CommandOutcome>;
}
