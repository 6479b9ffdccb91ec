//! What a batch measures and when it resets the build tool cache.

use std::fmt;
use std::str::FromStr;

use gonx_models::AnalyserKind;
use gonx_nx::NxCommand;

/// When the orchestrator runs `nx reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPolicy {
    /// Never reset.
    Never,
    /// Once before the first subject.
    OncePerBatch,
    /// Before each subject's first run.
    BeforeEachSubject,
    /// Before every run, so each measurement starts cold.
    BeforeEachRun,
}

impl ResetPolicy {
    /// Number of resets a batch performs when nothing fails.
    pub fn reset_count(&self, subjects: usize, runs: usize) -> usize {
        match self {
            ResetPolicy::Never => 0,
            ResetPolicy::OncePerBatch => usize::from(subjects > 0),
            ResetPolicy::BeforeEachSubject => subjects,
            ResetPolicy::BeforeEachRun => subjects * runs,
        }
    }

    /// Name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetPolicy::Never => "never",
            ResetPolicy::OncePerBatch => "once",
            ResetPolicy::BeforeEachSubject => "subject",
            ResetPolicy::BeforeEachRun => "run",
        }
    }
}

impl fmt::Display for ResetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResetPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "never" | "none" => Ok(ResetPolicy::Never),
            "once" | "batch" => Ok(ResetPolicy::OncePerBatch),
            "subject" | "project" => Ok(ResetPolicy::BeforeEachSubject),
            "run" | "always" => Ok(ResetPolicy::BeforeEachRun),
            other => Err(format!(
                "unknown reset policy: {} (expected never, once, subject or run)",
                other
            )),
        }
    }
}

/// A benchmark operation: the analyser plus its reset policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    kind: AnalyserKind,
    reset: ResetPolicy,
}

impl Operation {
    /// Creates an operation with the analyser's default reset policy.
    ///
    /// Bundle analysis resets once; timed analysers reset before every run.
    pub fn new(kind: AnalyserKind) -> Self {
        let reset = match kind {
            AnalyserKind::Bundle => ResetPolicy::OncePerBatch,
            AnalyserKind::Build | AnalyserKind::Lint | AnalyserKind::Test => {
                ResetPolicy::BeforeEachRun
            }
        };
        Self { kind, reset }
    }

    /// Overrides the reset policy.
    pub fn with_reset(mut self, reset: ResetPolicy) -> Self {
        self.reset = reset;
        self
    }

    pub fn kind(&self) -> AnalyserKind {
        self.kind
    }

    pub fn reset_policy(&self) -> ResetPolicy {
        self.reset
    }

    /// The timed sub-command for `subject`. Bundle analysis builds first.
    pub fn command(&self, subject: &str) -> NxCommand {
        let subject = subject.to_string();
        match self.kind {
            AnalyserKind::Bundle | AnalyserKind::Build => NxCommand::Build(subject),
            AnalyserKind::Lint => NxCommand::Lint(subject),
            AnalyserKind::Test => NxCommand::Test(subject),
        }
    }

    /// Effective runs per subject: bundle analysis runs once, others at
    /// least once.
    pub fn runs_per_subject(&self, requested: usize) -> usize {
        match self.kind {
            AnalyserKind::Bundle => 1,
            _ => requested.max(1),
        }
    }

    /// Number of events after `TotalCount` in a batch where nothing aborts.
    ///
    /// Each run emits a start and an outcome, each subject a stats start and
    /// an outcome, plus one event per reset and the final `BatchDone`.
    pub fn expected_event_count(&self, subjects: usize, requested_runs: usize) -> usize {
        let runs = self.runs_per_subject(requested_runs);
        self.reset.reset_count(subjects, runs) + subjects * runs * 2 + subjects * 2 + 1
    }
}
