//! Benchmark record types.
//!
//! Each analyser persists its own record shape. Field names follow the
//! history files written by earlier versions of the tool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::BenchmarkId;
use crate::project::ProjectKind;

/// The four analysers, each with its own history file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyserKind {
    /// Bundle size of an application's build output.
    Bundle,
    /// Wall time of `build`.
    Build,
    /// Wall time of `lint`.
    Lint,
    /// Wall time of `test`.
    Test,
}

impl AnalyserKind {
    /// All analysers.
    pub const ALL: [AnalyserKind; 4] = [
        AnalyserKind::Bundle,
        AnalyserKind::Build,
        AnalyserKind::Lint,
        AnalyserKind::Test,
    ];

    /// Short name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyserKind::Bundle => "bundle",
            AnalyserKind::Build => "build",
            AnalyserKind::Lint => "lint",
            AnalyserKind::Test => "test",
        }
    }

    /// Name of the history file for this analyser.
    pub fn file_name(&self) -> &'static str {
        match self {
            AnalyserKind::Bundle => "bundle-benchmarks.json",
            AnalyserKind::Build => "build-benchmarks.json",
            AnalyserKind::Lint => "lint-benchmarks.json",
            AnalyserKind::Test => "test-benchmarks.json",
        }
    }
}

impl fmt::Display for AnalyserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bundle" | "bundle-size" => Ok(AnalyserKind::Bundle),
            "build" | "build-time" => Ok(AnalyserKind::Build),
            "lint" | "lint-time" => Ok(AnalyserKind::Lint),
            "test" | "test-time" => Ok(AnalyserKind::Test),
            other => Err(format!("unknown analyser: {}", other)),
        }
    }
}

/// Byte counts of the initial (eagerly loaded) scripts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialStats {
    pub main: u64,
    pub runtime: u64,
    pub polyfills: u64,
    /// `main + runtime + polyfills`.
    pub total: u64,
}

/// Size breakdown of a build output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    pub initial: InitialStats,
    pub lazy: u64,
    pub assets: u64,
    /// `initial.total + lazy`.
    pub total: u64,
    /// `total + styles + assets`.
    pub overall_total: u64,
    pub styles: u64,
}

impl BuildStats {
    /// Recomputes the derived totals from the bucket values.
    pub fn compute_totals(&mut self) {
        self.initial.total = self.initial.main + self.initial.runtime + self.initial.polyfills;
        self.total = self.initial.total + self.lazy;
        self.overall_total = self.total + self.styles + self.assets;
    }
}

/// Aggregate of repeated run durations, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub min: f64,
    pub max: f64,
    #[serde(rename = "avg")]
    pub average: f64,
    /// Number of successful runs the aggregate was computed from.
    pub total_runs: usize,
    /// Number of runs that failed and were excluded.
    #[serde(default)]
    pub failed_runs: usize,
}

/// Bundle size record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleBenchmark {
    pub id: BenchmarkId,
    pub app_name: String,
    pub created_at: DateTime<Utc>,
    /// Seconds from batch start until the record was produced.
    pub duration: f64,
    #[serde(default)]
    pub description: String,
    pub stats: BuildStats,
}

/// Build time record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildBenchmark {
    pub id: BenchmarkId,
    pub app_name: String,
    pub created_at: DateTime<Utc>,
    pub duration: f64,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub stats: RunStats,
}

/// Lint or test time record for any kind of project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBenchmark {
    pub id: BenchmarkId,
    pub project: String,
    #[serde(rename = "type")]
    pub project_kind: ProjectKind,
    pub created_at: DateTime<Utc>,
    pub duration: f64,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub stats: RunStats,
}

pub type LintBenchmark = ProjectBenchmark;
pub type TestBenchmark = ProjectBenchmark;

/// A record of any analyser.
///
/// Serialized untagged: every history file holds a single analyser's shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BenchmarkRecord {
    Bundle(BundleBenchmark),
    Build(BuildBenchmark),
    Lint(LintBenchmark),
    Test(TestBenchmark),
}

impl BenchmarkRecord {
    /// Decodes a record of the given analyser from a JSON value.
    pub fn from_value(
        kind: AnalyserKind,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            AnalyserKind::Bundle => BenchmarkRecord::Bundle(serde_json::from_value(value)?),
            AnalyserKind::Build => BenchmarkRecord::Build(serde_json::from_value(value)?),
            AnalyserKind::Lint => BenchmarkRecord::Lint(serde_json::from_value(value)?),
            AnalyserKind::Test => BenchmarkRecord::Test(serde_json::from_value(value)?),
        })
    }

    /// The analyser that produced this record.
    pub fn kind(&self) -> AnalyserKind {
        match self {
            BenchmarkRecord::Bundle(_) => AnalyserKind::Bundle,
            BenchmarkRecord::Build(_) => AnalyserKind::Build,
            BenchmarkRecord::Lint(_) => AnalyserKind::Lint,
            BenchmarkRecord::Test(_) => AnalyserKind::Test,
        }
    }

    pub fn id(&self) -> &BenchmarkId {
        match self {
            BenchmarkRecord::Bundle(b) => &b.id,
            BenchmarkRecord::Build(b) => &b.id,
            BenchmarkRecord::Lint(b) | BenchmarkRecord::Test(b) => &b.id,
        }
    }

    /// Name of the benchmarked project.
    pub fn subject_name(&self) -> &str {
        match self {
            BenchmarkRecord::Bundle(b) => &b.app_name,
            BenchmarkRecord::Build(b) => &b.app_name,
            BenchmarkRecord::Lint(b) | BenchmarkRecord::Test(b) => &b.project,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            BenchmarkRecord::Bundle(b) => &b.description,
            BenchmarkRecord::Build(b) => &b.description,
            BenchmarkRecord::Lint(b) | BenchmarkRecord::Test(b) => &b.description,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            BenchmarkRecord::Bundle(b) => b.created_at,
            BenchmarkRecord::Build(b) => b.created_at,
            BenchmarkRecord::Lint(b) | BenchmarkRecord::Test(b) => b.created_at,
        }
    }

    /// Run statistics, for the time-based analysers.
    pub fn run_stats(&self) -> Option<&RunStats> {
        match self {
            BenchmarkRecord::Bundle(_) => None,
            BenchmarkRecord::Build(b) => Some(&b.stats),
            BenchmarkRecord::Lint(b) | BenchmarkRecord::Test(b) => Some(&b.stats),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_totals() {
        let mut stats = BuildStats {
            initial: InitialStats {
                main: 1000,
                runtime: 500,
                polyfills: 0,
                total: 0,
            },
            lazy: 300,
            styles: 200,
            assets: 50,
            ..Default::default()
        };
        stats.compute_totals();

        assert_eq!(stats.initial.total, 1500);
        assert_eq!(stats.total, 1800);
        assert_eq!(stats.overall_total, 2050);
    }

    #[test]
    fn test_build_record_keys() {
        let record = BuildBenchmark {
            id: BenchmarkId::from_string("id-1"),
            app_name: "shop".to_string(),
            created_at: Utc::now(),
            duration: 12.5,
            description: "baseline".to_string(),
            stats: RunStats {
                min: 1.0,
                max: 3.0,
                average: 2.0,
                total_runs: 3,
                failed_runs: 0,
            },
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["appName"], "shop");
        assert_eq!(json["avg"], 2.0);
        assert_eq!(json["totalRuns"], 3);
        assert!(json.get("stats").is_none());
    }

    #[test]
    fn test_legacy_lint_record_loads_without_failed_runs() {
        let value = serde_json::json!({
            "id": "5b0f",
            "project": "ui",
            "type": "library",
            "createdAt": "2025-01-10T10:00:00Z",
            "duration": 4.2,
            "description": "",
            "min": 1.0,
            "max": 2.0,
            "avg": 1.5,
            "totalRuns": 2
        });

        let record = BenchmarkRecord::from_value(AnalyserKind::Lint, value).unwrap();
        assert_eq!(record.kind(), AnalyserKind::Lint);
        assert_eq!(record.subject_name(), "ui");
        assert_eq!(record.run_stats().map(|s| s.failed_runs), Some(0));
    }

    #[test]
    fn test_analyser_kind_parsing() {
        assert_eq!("bundle-size".parse::<AnalyserKind>(), Ok(AnalyserKind::Bundle));
        assert_eq!("TEST".parse::<AnalyserKind>(), Ok(AnalyserKind::Test));
        assert!("deploy".parse::<AnalyserKind>().is_err());
        assert_eq!(AnalyserKind::Lint.file_name(), "lint-benchmarks.json");
    }
}
