//! Name-based project classification.
//!
//! End-to-end projects are recognised by name alone, which saves one
//! describe-project call each.

/// Returns true for names that are dropped from the workspace entirely.
pub fn is_excluded(name: &str) -> bool {
    name.ends_with(".e2e")
}

/// Returns true for names classified as end-to-end without probing.
pub fn is_e2e(name: &str) -> bool {
    name.contains("-e2e")
}

/// Project names split by how they are handled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionedNames {
    /// End-to-end projects, classified locally.
    pub e2e: Vec<String>,
    /// Projects that need a describe-project call.
    pub to_probe: Vec<String>,
    /// Projects dropped by pattern.
    pub excluded: Vec<String>,
}

impl PartitionedNames {
    /// Names that end up in the workspace if every probe succeeds.
    pub fn retained(&self) -> impl Iterator<Item = &String> {
        self.e2e.iter().chain(self.to_probe.iter())
    }
}

/// Sorts, deduplicates and partitions a project list.
pub fn partition_names<I, S>(names: I) -> PartitionedNames
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
    names.sort();
    names.dedup();

    let mut partitioned = PartitionedNames::default();
    for name in names {
        if is_excluded(&name) {
            partitioned.excluded.push(name);
        } else if is_e2e(&name) {
            partitioned.e2e.push(name);
        } else {
            partitioned.to_probe.push(name);
        }
    }
    partitioned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition() {
        let parts = partition_names(["ui", "shop-e2e", "shop", "legacy.e2e", "shop"]);

        assert_eq!(parts.to_probe, vec!["shop", "ui"]);
        assert_eq!(parts.e2e, vec!["shop-e2e"]);
        assert_eq!(parts.excluded, vec!["legacy.e2e"]);
        assert_eq!(parts.retained().count(), 3);
    }

    #[test]
    fn test_e2e_substring_anywhere() {
        assert!(is_e2e("admin-e2e-smoke"));
        assert!(!is_e2e("e2e"));
        assert!(is_excluded("admin.e2e"));
        assert!(!is_excluded("admin.e2e.config"));
    }

    #[test]
    fn test_empty_list() {
        let parts = partition_names(Vec::<String>::new());
        assert_eq!(parts, PartitionedNames::default());
    }
}
