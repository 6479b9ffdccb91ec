//! Child-process implementation of [`NxClient`].

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use gonx_core::config;

use crate::client::{parse_project_list, CommandOutcome, NxClient, NxCommand, ProjectDescription};
use crate::error::{NxError, Result};

/// Lines of output kept in a [`NxError::CommandFailed`] message.
const FAILURE_OUTPUT_LINES: usize = 40;

/// Runs the `nx` binary in a workspace root.
#[derive(Debug, Clone)]
pub struct NxCli {
    /// Path to the build tool binary.
    program: PathBuf,
    /// Workspace root, used as the working directory of every child.
    root: PathBuf,
    /// Extra environment for every child.
    env: Vec<(String, String)>,
}

impl NxCli {
    /// Create a client for the workspace at `root`.
    ///
    /// Looks the binary up in PATH (see [`config::nx_program`]).
    ///
    /// # Errors
    ///
    /// Returns `NxError::NotFound` if the binary is not available.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let name = config::nx_program();
        let program = which::which(&name).map_err(|_| NxError::NotFound(name.clone()))?;
        debug!(path = %program.display(), "nx found");
        Ok(Self::with_program(root, program))
    }

    /// Create a client with an explicit binary path.
    pub fn with_program(root: impl Into<PathBuf>, program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            root: root.into(),
            env: config::NX_CHILD_ENV
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Check if the build tool is available in PATH.
    pub fn is_available() -> bool {
        which::which(config::nx_program()).is_ok()
    }

    /// Workspace root the client runs in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(&self.root)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn describe(args: &[String]) -> String {
        format!("nx {}", args.join(" "))
    }

    /// Run a command to completion and return its raw output.
    async fn run_raw(&self, args: &[String]) -> Result<Output> {
        trace!(args = ?args, "running nx command");
        let output = self
            .command(args)
            .output()
            .await
            .map_err(|source| NxError::Spawn {
                command: Self::describe(args),
                source,
            })?;
        trace!(
            status = %output.status,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "nx command completed"
        );
        Ok(output)
    }

    /// Run a command and return stdout on success.
    async fn run_checked(&self, args: &[String]) -> Result<String> {
        let output = self.run_raw(args).await?;
        check_status(&Self::describe(args), &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Maps a non-zero exit status to [`NxError::CommandFailed`].
fn check_status(command: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    Err(NxError::CommandFailed {
        command: command.to_string(),
        status: output.status.to_string(),
        output: tail_lines(&combined_output(output), FAILURE_OUTPUT_LINES),
    })
}

/// Stdout followed by stderr.
fn combined_output(output: &Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&stderr);
    }
    combined
}

/// Keeps the last `n` lines of `text`.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[async_trait]
impl NxClient for NxCli {
    async fn list_projects(&self) -> Result<Vec<String>> {
        let args = ["show".to_string(), "projects".to_string()];
        let stdout = self.run_checked(&args).await?;
        let projects = parse_project_list(&stdout);
        debug!(count = projects.len(), "listed projects");
        Ok(projects)
    }

    async fn describe_project(&self, name: &str) -> Result<ProjectDescription> {
        let args = [
            "show".to_string(),
            "project".to_string(),
            name.to_string(),
            "--json".to_string(),
        ];
        let stdout = self.run_checked(&args).await?;
        ProjectDescription::parse(&Self::describe(&args), &stdout)
    }

    async fn run(
        &self,
        command: &NxCommand,
        cancel: &CancellationToken,
    ) -> Result<CommandOutcome> {
        let args = command.args();
        let label = command.to_string();
        debug!(command = %label, "starting");

        let started = Instant::now();
        let child = self
            .command(&args)
            .spawn()
            .map_err(|source| NxError::Spawn {
                command: label.clone(),
                source,
            })?;

        // Dropping the wait future drops the child, and kill_on_drop
        // terminates the process.
        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = cancel.cancelled() => {
                debug!(command = %label, "cancelled, killing child");
                return Err(NxError::Cancelled(label));
            }
        };
        let duration = started.elapsed();

        check_status(&label, &output)?;
        debug!(command = %label, secs = duration.as_secs_f64(), "finished");

        Ok(CommandOutcome {
            duration,
            output: combined_output(&output),
        })
    }
}
