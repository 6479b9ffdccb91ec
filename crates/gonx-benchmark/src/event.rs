//! Batch progress events.

use std::time::Duration;

use gonx_models::BenchmarkRecord;

/// Events emitted by a running batch, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Always first: the number of events that follow, `BatchDone` included.
    TotalCount(usize),
    /// A build tool cache reset is starting.
    ResetStart,
    /// A run of a subject is starting.
    RunStart {
        subject: String,
        /// Zero-based.
        run_index: usize,
        total_runs: usize,
    },
    /// A run finished successfully.
    RunComplete { subject: String, duration: Duration },
    /// A run failed, or the subject was abandoned (`run_index` is `None`).
    RunFailed {
        subject: String,
        run_index: Option<usize>,
        error: String,
    },
    /// Aggregation and persistence for a subject is starting.
    StatsWriteStart { subject: String },
    /// The subject's record was persisted.
    StatsWriteComplete { record: BenchmarkRecord },
    /// The subject's record could not be produced or persisted.
    StatsWriteFailed { subject: String, error: String },
    /// Always last.
    BatchDone,
}

impl ProgressEvent {
    /// Returns the subject this event concerns, if any.
    pub fn subject(&self) -> Option<&str> {
        match self {
            ProgressEvent::RunStart { subject, .. }
            | ProgressEvent::RunComplete { subject, .. }
            | ProgressEvent::RunFailed { subject, .. }
            | ProgressEvent::StatsWriteStart { subject }
            | ProgressEvent::StatsWriteFailed { subject, .. } => Some(subject),
            ProgressEvent::StatsWriteComplete { record } => Some(record.subject_name()),
            ProgressEvent::TotalCount(_) | ProgressEvent::ResetStart | ProgressEvent::BatchDone => {
                None
            }
        }
    }

    /// Returns true for failure events.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProgressEvent::RunFailed { .. } | ProgressEvent::StatsWriteFailed { .. }
        )
    }

    /// Returns true for the final event of a batch.
    pub fn is_done(&self) -> bool {
        matches!(self, ProgressEvent::BatchDone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_subject() {
        let event = ProgressEvent::RunStart {
            subject: "shop".to_string(),
            run_index: 0,
            total_runs: 3,
        };
        assert_eq!(event.subject(), Some("shop"));
        assert_eq!(ProgressEvent::ResetStart.subject(), None);
        assert_eq!(ProgressEvent::TotalCount(4).subject(), None);
    }

    #[test]
    fn test_event_flags() {
        let failed = ProgressEvent::RunFailed {
            subject: "ui".to_string(),
            run_index: None,
            error: "nx reset failed".to_string(),
        };
        assert!(failed.is_failure());
        assert!(!failed.is_done());
        assert!(ProgressEvent::BatchDone.is_done());
        assert!(!ProgressEvent::BatchDone.is_failure());
    }
}
