//! Text rendering for terminal output.

use std::time::Duration;

use gonx_benchmark::ProgressEvent;
use gonx_models::BenchmarkRecord;

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;

/// Formats a byte count: `512 B`, `12.50 KB`, or `2048.00 KB (2.00 MB)`.
pub fn format_size(bytes: u64) -> String {
    let value = bytes as f64;
    if value < KB {
        format!("{} B", bytes)
    } else if value < MB {
        format!("{:.2} KB", value / KB)
    } else {
        format!("{:.2} KB ({:.2} MB)", value / KB, value / MB)
    }
}

/// Formats seconds as `850ms`, `12.34s` or `2m 05.0s`.
pub fn format_secs(secs: f64) -> String {
    if secs < 1.0 {
        format!("{}ms", (secs * 1000.0).round() as u64)
    } else if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        let minutes = (secs / 60.0).floor();
        format!("{}m {:04.1}s", minutes as u64, secs - minutes * 60.0)
    }
}

pub fn format_duration(duration: Duration) -> String {
    format_secs(duration.as_secs_f64())
}

/// Truncates a string to `max_len` characters, adding "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One status line per event. `TotalCount` and `BatchDone` produce none.
pub fn event_line(event: &ProgressEvent) -> Option<String> {
    let line = match event {
        ProgressEvent::TotalCount(_) | ProgressEvent::BatchDone => return None,
        ProgressEvent::ResetStart => "resetting nx cache".to_string(),
        ProgressEvent::RunStart {
            subject,
            run_index,
            total_runs,
        } => {
            if *total_runs > 1 {
                format!("{}: run {}/{}", subject, run_index + 1, total_runs)
            } else {
                format!("{}: running", subject)
            }
        }
        ProgressEvent::RunComplete { subject, duration } => {
            format!("{}: done in {}", subject, format_duration(*duration))
        }
        ProgressEvent::RunFailed {
            subject,
            run_index: Some(index),
            error,
        } => format!("{}: run {} failed: {}", subject, index + 1, first_line(error)),
        ProgressEvent::RunFailed {
            subject,
            run_index: None,
            error,
        } => format!("{}: skipped: {}", subject, first_line(error)),
        ProgressEvent::StatsWriteStart { subject } => format!("{}: writing stats", subject),
        ProgressEvent::StatsWriteComplete { record } => {
            format!("{}: {}", record.subject_name(), summary(record))
        }
        ProgressEvent::StatsWriteFailed { subject, error } => {
            format!("{}: stats not written: {}", subject, first_line(error))
        }
    };
    Some(line)
}

/// Short result summary of a record.
pub fn summary(record: &BenchmarkRecord) -> String {
    match record {
        BenchmarkRecord::Bundle(bundle) => format!(
            "initial {}, overall {}",
            format_size(bundle.stats.initial.total),
            format_size(bundle.stats.overall_total)
        ),
        BenchmarkRecord::Build(_) | BenchmarkRecord::Lint(_) | BenchmarkRecord::Test(_) => {
            match record.run_stats() {
                Some(stats) => format!(
                    "avg {} (min {}, max {}, {} run(s))",
                    format_secs(stats.average),
                    format_secs(stats.min),
                    format_secs(stats.max),
                    stats.total_runs
                ),
                None => String::new(),
            }
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
