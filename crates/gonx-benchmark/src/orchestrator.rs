//! Sequential multi-run benchmark batches.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use gonx_models::{
    AnalyserKind, BenchmarkId, BenchmarkRecord, BuildBenchmark, BuildStats, BundleBenchmark,
    Project, ProjectBenchmark,
};
use gonx_nx::{NxClient, NxCommand};
use gonx_persistence::ResultStore;

use crate::bundle;
use crate::config::BenchmarkConfig;
use crate::error::{BenchmarkError, Result};
use crate::event::ProgressEvent;
use crate::operation::{Operation, ResetPolicy};
use crate::stats::aggregate;

/// Runs benchmark batches of one operation.
pub struct BenchmarkOrchestrator {
    client: Arc<dyn NxClient>,
    operation: Operation,
    store: ResultStore,
    root: PathBuf,
}

impl BenchmarkOrchestrator {
    /// Creates an orchestrator for `operation`.
    pub fn new(client: Arc<dyn NxClient>, operation: Operation, config: BenchmarkConfig) -> Self {
        Self {
            client,
            operation,
            store: ResultStore::new(config.results_dir),
            root: config.root,
        }
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Starts a batch in a background task.
    ///
    /// Subjects are processed strictly in order, one external command at a
    /// time. The first event is [`ProgressEvent::TotalCount`] and the last is
    /// [`ProgressEvent::BatchDone`]. If a reset fails or the batch is
    /// cancelled, every subject not yet finished gets a `RunFailed` with no
    /// run index and the batch ends early, so fewer events arrive than
    /// announced.
    pub fn run(&self, subjects: Vec<Project>, description: impl Into<String>, runs: usize) -> BatchHandle {
        let runs = self.operation.runs_per_subject(runs);
        let total = self.operation.expected_event_count(subjects.len(), runs);
        let (tx, rx) = mpsc::channel(total + 1);
        let cancel = CancellationToken::new();

        let batch = Batch {
            client: Arc::clone(&self.client),
            operation: self.operation,
            store: self.store.clone(),
            root: self.root.clone(),
            description: description.into(),
            runs,
            cancel: cancel.clone(),
            tx,
            started: Instant::now(),
        };

        info!(
            analyser = %self.operation.kind(),
            subjects = subjects.len(),
            runs,
            reset = %self.operation.reset_policy(),
            "starting benchmark batch"
        );

        let task = tokio::spawn(async move {
            batch.execute(subjects, total).await;
        });

        BatchHandle {
            events: rx,
            task,
            cancel,
        }
    }
}

/// A running batch.
pub struct BatchHandle {
    events: mpsc::Receiver<ProgressEvent>,
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl BatchHandle {
    /// Waits for the next event. `None` once the batch has finished and all
    /// events were received.
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.events.recv().await
    }

    /// Requests cancellation. The in-flight command is killed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this batch when fired.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drains every remaining event and waits for the task to finish.
    pub async fn collect(mut self) -> Result<Vec<ProgressEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        self.task
            .await
            .map_err(|e| BenchmarkError::Task(e.to_string()))?;
        Ok(events)
    }
}

/// Why a batch stopped early, and from which subject on nothing finished.
struct Aborted {
    from: usize,
    reason: String,
}

impl Aborted {
    fn at(from: usize, reason: impl Into<String>) -> Self {
        Self {
            from,
            reason: reason.into(),
        }
    }
}

/// State owned by the batch task.
struct Batch {
    client: Arc<dyn NxClient>,
    operation: Operation,
    store: ResultStore,
    root: PathBuf,
    description: String,
    runs: usize,
    cancel: CancellationToken,
    tx: mpsc::Sender<ProgressEvent>,
    started: Instant,
}

impl Batch {
    async fn execute(self, subjects: Vec<Project>, total: usize) {
        self.emit(ProgressEvent::TotalCount(total)).await;

        if let Err(aborted) = self.run_subjects(&subjects).await {
            warn!(reason = %aborted.reason, "benchmark batch aborted");
            for subject in &subjects[aborted.from.min(subjects.len())..] {
                self.emit(ProgressEvent::RunFailed {
                    subject: subject.name.clone(),
                    run_index: None,
                    error: aborted.reason.clone(),
                })
                .await;
            }
        }

        self.emit(ProgressEvent::BatchDone).await;
        info!(
            secs = self.started.elapsed().as_secs_f64(),
            "benchmark batch finished"
        );
    }

    async fn run_subjects(&self, subjects: &[Project]) -> std::result::Result<(), Aborted> {
        let policy = self.operation.reset_policy();

        if policy == ResetPolicy::OncePerBatch && !subjects.is_empty() {
            self.reset().await.map_err(|reason| Aborted::at(0, reason))?;
        }

        for (index, subject) in subjects.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(Aborted::at(index, "batch cancelled"));
            }
            if policy == ResetPolicy::BeforeEachSubject {
                self.reset().await.map_err(|reason| Aborted::at(index, reason))?;
            }
            self.run_subject(index, subject).await?;
        }
        Ok(())
    }

    async fn run_subject(&self, index: usize, subject: &Project) -> std::result::Result<(), Aborted> {
        let mut durations = Vec::with_capacity(self.runs);
        let mut failed_runs = 0;
        let mut bundle_stats = None;

        for run_index in 0..self.runs {
            if self.cancel.is_cancelled() {
                return Err(Aborted::at(index, "batch cancelled"));
            }
            if self.operation.reset_policy() == ResetPolicy::BeforeEachRun {
                self.reset().await.map_err(|reason| Aborted::at(index, reason))?;
            }

            self.emit(ProgressEvent::RunStart {
                subject: subject.name.clone(),
                run_index,
                total_runs: self.runs,
            })
            .await;

            match self.measure_run(subject).await {
                Ok((duration, stats)) => {
                    durations.push(duration.as_secs_f64());
                    if stats.is_some() {
                        bundle_stats = stats;
                    }
                    self.emit(ProgressEvent::RunComplete {
                        subject: subject.name.clone(),
                        duration,
                    })
                    .await;
                }
                Err(e) => {
                    let cancelled = matches!(&e, BenchmarkError::Nx(nx) if nx.is_cancelled());
                    warn!(subject = %subject.name, run = run_index, error = %e, "run failed");
                    self.emit(ProgressEvent::RunFailed {
                        subject: subject.name.clone(),
                        run_index: Some(run_index),
                        error: e.to_string(),
                    })
                    .await;
                    if cancelled {
                        return Err(Aborted::at(index + 1, "batch cancelled"));
                    }
                    failed_runs += 1;
                }
            }
        }

        self.write_stats(subject, &durations, failed_runs, bundle_stats)
            .await;
        Ok(())
    }

    /// Runs the build tool cache reset. The error is the message every
    /// abandoned subject is reported with.
    async fn reset(&self) -> std::result::Result<(), String> {
        self.emit(ProgressEvent::ResetStart).await;
        debug!("resetting nx cache");
        self.client
            .run(&NxCommand::Reset, &self.cancel)
            .await
            .map(|_| ())
            .map_err(|e| {
                if e.is_cancelled() {
                    "batch cancelled".to_string()
                } else {
                    format!("workspace reset failed: {}", e)
                }
            })
    }

    /// One timed run; bundle analysis also measures the output directory.
    async fn measure_run(&self, subject: &Project) -> Result<(Duration, Option<BuildStats>)> {
        let output_path = match self.operation.kind() {
            AnalyserKind::Bundle => Some(
                subject
                    .output_path
                    .as_deref()
                    .ok_or_else(|| BenchmarkError::MissingOutputPath(subject.name.clone()))?,
            ),
            _ => None,
        };

        let outcome = self
            .client
            .run(&self.operation.command(&subject.name), &self.cancel)
            .await?;

        let stats = match output_path {
            Some(path) => Some(bundle::measure(&self.root, path)?),
            None => None,
        };
        Ok((outcome.duration, stats))
    }

    async fn write_stats(
        &self,
        subject: &Project,
        durations: &[f64],
        failed_runs: usize,
        bundle_stats: Option<BuildStats>,
    ) {
        self.emit(ProgressEvent::StatsWriteStart {
            subject: subject.name.clone(),
        })
        .await;

        let written = self
            .record(subject, durations, failed_runs, bundle_stats)
            .and_then(|record| {
                self.store.append(&record)?;
                Ok(record)
            });

        match written {
            Ok(record) => {
                info!(subject = %subject.name, id = %record.id(), "benchmark recorded");
                self.emit(ProgressEvent::StatsWriteComplete { record }).await;
            }
            Err(e) => {
                warn!(subject = %subject.name, error = %e, "benchmark not recorded");
                self.emit(ProgressEvent::StatsWriteFailed {
                    subject: subject.name.clone(),
                    error: e.to_string(),
                })
                .await;
            }
        }
    }

    fn record(
        &self,
        subject: &Project,
        durations: &[f64],
        failed_runs: usize,
        bundle_stats: Option<BuildStats>,
    ) -> Result<BenchmarkRecord> {
        let no_runs = || BenchmarkError::NoSuccessfulRuns(subject.name.clone());
        let stats = aggregate(durations, failed_runs).ok_or_else(no_runs)?;

        let id = BenchmarkId::new();
        let created_at = Utc::now();
        let duration = self.started.elapsed().as_secs_f64();
        let description = self.description.clone();

        Ok(match self.operation.kind() {
            AnalyserKind::Bundle => BenchmarkRecord::Bundle(BundleBenchmark {
                id,
                app_name: subject.name.clone(),
                created_at,
                duration,
                description,
                stats: bundle_stats.ok_or_else(no_runs)?,
            }),
            AnalyserKind::Build => BenchmarkRecord::Build(BuildBenchmark {
                id,
                app_name: subject.name.clone(),
                created_at,
                duration,
                description,
                stats,
            }),
            kind @ (AnalyserKind::Lint | AnalyserKind::Test) => {
                let record = ProjectBenchmark {
                    id,
                    project: subject.name.clone(),
                    project_kind: subject.kind,
                    created_at,
                    duration,
                    description,
                    stats,
                };
                if kind == AnalyserKind::Lint {
                    BenchmarkRecord::Lint(record)
                } else {
                    BenchmarkRecord::Test(record)
                }
            }
        })
    }

    /// Sends an event. A dropped receiver cancels the batch: nobody is
    /// left to report to.
    async fn emit(&self, event: ProgressEvent) {
        trace!(event = ?event, "progress");
        if self.tx.send(event).await.is_err() && !self.cancel.is_cancelled() {
            debug!("progress receiver dropped, cancelling batch");
            self.cancel.cancel();
        }
    }
}
