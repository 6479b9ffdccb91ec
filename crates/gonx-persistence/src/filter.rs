//! Record filtering for history views.

use gonx_models::BenchmarkRecord;

/// Filter criteria for browsing benchmark history.
///
/// Read-only: filtering never touches the stored files.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Substring matched against the subject name or the description.
    pub search: Option<String>,
    /// Exact subject name.
    pub subject: Option<String>,
}

impl RecordFilter {
    /// Creates a filter on a search substring. An empty string matches all.
    pub fn new(search: impl Into<String>) -> Self {
        let search = search.into();
        Self {
            search: (!search.is_empty()).then_some(search),
            subject: None,
        }
    }

    /// Restricts the filter to a single subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Returns true if the record matches this filter.
    pub fn matches(&self, record: &BenchmarkRecord) -> bool {
        if let Some(ref subject) = self.subject {
            if record.subject_name() != subject {
                return false;
            }
        }

        if let Some(ref search) = self.search {
            if !record.subject_name().contains(search.as_str())
                && !record.description().contains(search.as_str())
            {
                return false;
            }
        }

        true
    }

    /// Keeps the matching records, preserving order.
    pub fn apply(&self, records: Vec<BenchmarkRecord>) -> Vec<BenchmarkRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gonx_models::{BenchmarkId, ProjectBenchmark, ProjectKind, RunStats};

    fn lint_record(project: &str, description: &str) -> BenchmarkRecord {
        BenchmarkRecord::Lint(ProjectBenchmark {
            id: BenchmarkId::new(),
            project: project.to_string(),
            project_kind: ProjectKind::Library,
            created_at: Utc::now(),
            duration: 1.0,
            description: description.to_string(),
            stats: RunStats::default(),
        })
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = RecordFilter::new("");
        assert!(filter.matches(&lint_record("ui", "")));
    }

    #[test]
    fn test_search_matches_name_or_description() {
        let filter = RecordFilter::new("eslint-9");
        assert!(filter.matches(&lint_record("ui", "after eslint-9 upgrade")));
        assert!(!filter.matches(&lint_record("ui", "baseline")));

        let filter = RecordFilter::new("shop");
        assert!(filter.matches(&lint_record("shop-data", "")));
    }

    #[test]
    fn test_search_is_case_sensitive() {
        let filter = RecordFilter::new("Shop");
        assert!(!filter.matches(&lint_record("shop", "")));
    }

    #[test]
    fn test_subject_and_order() {
        let records = vec![
            lint_record("ui", "b"),
            lint_record("utils", "a"),
            lint_record("ui", "a"),
        ];

        let filtered = RecordFilter::new("").with_subject("ui").apply(records);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].description(), "b");
        assert_eq!(filtered[1].description(), "a");
    }
}
