//! Command handlers for CLI subcommands.

use std::path::Path;
use std::sync::Arc;

use gonx_benchmark::{
    BenchmarkConfig, BenchmarkOrchestrator, Operation, ProgressEvent, ResetPolicy,
};
use gonx_core::config;
use gonx_models::{AnalyserKind, BenchmarkRecord, Project, ProjectKind, Workspace};
use gonx_nx::{NxCli, NxClient};
use gonx_persistence::{RecordFilter, ResultStore};
use gonx_workspace::{CacheStore, ResolverConfig, WorkspaceResolver};
use tracing::{info, warn};

use crate::cli::{CacheAction, Commands, OutputFormat};
use crate::output::{event_line, format_secs, format_size, summary, truncate};

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Execute a CLI command against the workspace at `root`.
pub async fn execute(command: Commands, root: &Path) -> Result<()> {
    match command {
        Commands::Projects { format, no_cache } => cmd_projects(root, format, no_cache).await,
        Commands::Bench {
            analyser,
            projects,
            all,
            runs,
            description,
            reset,
        } => cmd_bench(root, analyser, &projects, all, runs, description, reset).await,
        Commands::History {
            analyser,
            search,
            project,
            limit,
            format,
        } => cmd_history(root, analyser, &search, project, limit, format),
        Commands::Cache {
            action: CacheAction::Clear,
        } => cmd_cache_clear(root),
    }
}

async fn resolve(root: &Path, client: Arc<dyn NxClient>, use_cache: bool) -> Result<Workspace> {
    let config = ResolverConfig::new(root).with_cache(use_cache);
    let workspace = WorkspaceResolver::new(root, client, config).resolve().await?;
    Ok(workspace)
}

async fn cmd_projects(root: &Path, format: OutputFormat, no_cache: bool) -> Result<()> {
    let client = Arc::new(NxCli::new(root)?);
    let workspace = resolve(root, client, !no_cache).await?;
    print_workspace(&workspace, format)
}

fn print_workspace(workspace: &Workspace, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if workspace.is_empty() {
                println!("No projects found.");
                return Ok(());
            }

            println!("{:<32}  {:<12}  OUTPUT", "NAME", "KIND");
            println!("{}", "-".repeat(72));
            for project in workspace.iter() {
                println!(
                    "{:<32}  {:<12}  {}",
                    truncate(&project.name, 32),
                    project.kind,
                    project.output_path.as_deref().unwrap_or("-")
                );
            }
            println!(
                "\n{}: {} application(s), {} librar(ies), {} e2e project(s)",
                workspace.name,
                workspace.applications.len(),
                workspace.libraries.len(),
                workspace.e2e_apps.len()
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(workspace)?);
        }
        OutputFormat::Brief => {
            for project in workspace.iter() {
                println!("{}\t{}", project.name, project.kind);
            }
        }
    }
    Ok(())
}

/// Project kinds each analyser can measure.
fn eligible_kinds(analyser: AnalyserKind) -> &'static [ProjectKind] {
    match analyser {
        AnalyserKind::Bundle | AnalyserKind::Build => &[ProjectKind::Application],
        AnalyserKind::Lint | AnalyserKind::Test => &[
            ProjectKind::Application,
            ProjectKind::Library,
            ProjectKind::E2e,
        ],
    }
}

/// Picks the batch subjects: every eligible project with `all`, otherwise
/// the named ones in the order given.
fn select_subjects(
    workspace: &Workspace,
    analyser: AnalyserKind,
    names: &[String],
    all: bool,
) -> Result<Vec<Project>> {
    let kinds = eligible_kinds(analyser);
    if all {
        return Ok(workspace.projects(kinds));
    }
    if names.is_empty() {
        return Err("no projects selected (pass project names or --all)".into());
    }

    names
        .iter()
        .map(|name| -> Result<Project> {
            let project = workspace
                .find(name)
                .ok_or_else(|| format!("Project not found: {}", name))?;
            if !kinds.contains(&project.kind) {
                return Err(format!(
                    "{} is a {} project and cannot be measured by the {} analyser",
                    name, project.kind, analyser
                )
                .into());
            }
            Ok(project.clone())
        })
        .collect()
}

async fn cmd_bench(
    root: &Path,
    analyser: AnalyserKind,
    names: &[String],
    all: bool,
    runs: usize,
    description: String,
    reset: Option<ResetPolicy>,
) -> Result<()> {
    let client: Arc<dyn NxClient> = Arc::new(NxCli::new(root)?);
    let workspace = resolve(root, Arc::clone(&client), true).await?;
    let subjects = select_subjects(&workspace, analyser, names, all)?;
    if subjects.is_empty() {
        println!("No eligible projects found.");
        return Ok(());
    }

    config::ensure_all_dirs(root)?;
    let mut operation = Operation::new(analyser);
    if let Some(reset) = reset {
        operation = operation.with_reset(reset);
    }

    info!(analyser = %analyser, subjects = subjects.len(), "starting benchmark");
    let orchestrator = BenchmarkOrchestrator::new(client, operation, BenchmarkConfig::new(root));
    let mut batch = orchestrator.run(subjects, description, runs);

    let token = batch.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling batch");
            token.cancel();
        }
    });

    let mut total = 0;
    let mut seen = 0;
    let mut failures = 0;
    let mut records = Vec::new();
    while let Some(event) = batch.next_event().await {
        if let ProgressEvent::TotalCount(n) = event {
            total = n;
            continue;
        }
        seen += 1;
        if event.is_failure() {
            failures += 1;
        }
        if let Some(line) = event_line(&event) {
            println!("[{:>width$}/{}] {}", seen, total, line, width = total.to_string().len());
        }
        if let ProgressEvent::StatsWriteComplete { record } = event {
            records.push(record);
        }
    }
    ctrl_c.abort();

    if !records.is_empty() {
        println!();
        print_records(analyser, &records, OutputFormat::Table)?;
    }

    if failures > 0 {
        return Err(format!("benchmark finished with {} failure(s)", failures).into());
    }
    Ok(())
}

fn cmd_history(
    root: &Path,
    analyser: AnalyserKind,
    search: &str,
    project: Option<String>,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let store = ResultStore::new(config::benchmarks_dir(root));
    let mut filter = RecordFilter::new(search);
    if let Some(project) = project {
        filter = filter.with_subject(project);
    }

    let mut records = filter.apply(store.load_all(analyser)?);
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    print_records(analyser, &records, format)
}

fn print_records(
    analyser: AnalyserKind,
    records: &[BenchmarkRecord],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if records.is_empty() {
                println!("No {} benchmarks found.", analyser);
                return Ok(());
            }

            if analyser == AnalyserKind::Bundle {
                println!(
                    "{:<16}  {:<24}  {:>12}  {:>12}  {:>12}  {:>24}  DESCRIPTION",
                    "DATE", "APP", "INITIAL", "LAZY", "STYLES", "OVERALL"
                );
            } else {
                println!(
                    "{:<16}  {:<24}  {:>9}  {:>9}  {:>9}  {:>5}  DESCRIPTION",
                    "DATE", "PROJECT", "AVG", "MIN", "MAX", "RUNS"
                );
            }
            println!("{}", "-".repeat(110));
            for record in records {
                println!("{}", record_row(record));
            }
            println!("\n{} record(s)", records.len());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        OutputFormat::Brief => {
            for record in records {
                println!("{}\t{}\t{}", record.id(), record.subject_name(), summary(record));
            }
        }
    }
    Ok(())
}

fn record_row(record: &BenchmarkRecord) -> String {
    let date = record.created_at().format("%Y-%m-%d %H:%M").to_string();
    let name = truncate(record.subject_name(), 24);
    let description = truncate(record.description(), 40);

    match record {
        BenchmarkRecord::Bundle(bundle) => format!(
            "{:<16}  {:<24}  {:>12}  {:>12}  {:>12}  {:>24}  {}",
            date,
            name,
            format_size(bundle.stats.initial.total),
            format_size(bundle.stats.lazy),
            format_size(bundle.stats.styles),
            format_size(bundle.stats.overall_total),
            description
        ),
        _ => match record.run_stats() {
            Some(stats) => format!(
                "{:<16}  {:<24}  {:>9}  {:>9}  {:>9}  {:>5}  {}",
                date,
                name,
                format_secs(stats.average),
                format_secs(stats.min),
                format_secs(stats.max),
                stats.total_runs,
                description
            ),
            None => format!("{:<16}  {:<24}", date, name),
        },
    }
}

fn cmd_cache_clear(root: &Path) -> Result<()> {
    let store = CacheStore::new(root, config::cache_file(root));
    if store.clear()? {
        println!("Removed {}", store.path().display());
    } else {
        println!("No workspace cache at {}", store.path().display());
    }
    Ok(())
}
