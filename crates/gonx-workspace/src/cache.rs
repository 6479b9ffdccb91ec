//! On-disk workspace snapshot and its freshness rules.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use gonx_models::Workspace;
use gonx_nx::NxClient;
use gonx_persistence::atomic::{atomic_write_json, read_json_optional};

use crate::error::Result;
use crate::partition::partition_names;

/// Manifest file names, in lookup order.
const MANIFEST_FILES: [&str; 2] = ["project.json", "package.json"];

/// Conventional parent folders for projects.
const PROJECT_FOLDERS: [&str; 2] = ["apps", "libs"];

/// Snapshot bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    /// When the snapshot was resolved.
    pub timestamp: DateTime<Utc>,
    /// Manifest path of every project, relative to the workspace root.
    /// `None` when no manifest could be located.
    pub project_paths: BTreeMap<String, Option<PathBuf>>,
    /// Listed projects whose type is not tracked, with their manifests.
    /// They are not in the workspace but still count as known names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unsupported: BTreeMap<String, Option<PathBuf>>,
}

impl CacheMetadata {
    /// Every project name the snapshot accounts for.
    pub fn known_names(&self) -> BTreeSet<&String> {
        self.project_paths.keys().chain(self.unsupported.keys()).collect()
    }

    fn manifests(&self) -> impl Iterator<Item = (&String, &Option<PathBuf>)> {
        self.project_paths.iter().chain(self.unsupported.iter())
    }
}

/// A resolved workspace plus what is needed to decide whether it is stale.
///
/// The keys of `metadata.project_paths` are exactly the names of the
/// projects in `workspace`. Snapshots are replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    #[serde(alias = "model")]
    pub workspace: Workspace,
    pub metadata: CacheMetadata,
}

impl CacheSnapshot {
    /// Creates a snapshot resolved now.
    ///
    /// Projects missing from `project_paths` are recorded with no manifest;
    /// entries for names outside the workspace are dropped.
    pub fn new(workspace: Workspace, mut project_paths: BTreeMap<String, Option<PathBuf>>) -> Self {
        let names: BTreeSet<String> = workspace.project_names().into_iter().collect();
        project_paths.retain(|name, _| names.contains(name));
        for name in names {
            project_paths.entry(name).or_insert(None);
        }

        Self {
            workspace,
            metadata: CacheMetadata {
                timestamp: Utc::now(),
                project_paths,
                unsupported: BTreeMap::new(),
            },
        }
    }

    /// Records listed projects that were described but not tracked.
    /// Names that are part of the workspace are ignored.
    pub fn with_unsupported(mut self, mut unsupported: BTreeMap<String, Option<PathBuf>>) -> Self {
        unsupported.retain(|name, _| !self.metadata.project_paths.contains_key(name));
        self.metadata.unsupported = unsupported;
        self
    }

    /// Returns true if the manifest keys match the workspace's projects and
    /// no unsupported name shadows one of them.
    pub fn is_consistent(&self) -> bool {
        let names: BTreeSet<String> = self.workspace.project_names().into_iter().collect();
        names.len() == self.workspace.len()
            && names.iter().eq(self.metadata.project_paths.keys())
            && self
                .metadata
                .unsupported
                .keys()
                .all(|name| !names.contains(name))
    }
}

/// Outcome of a freshness check.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheStatus {
    /// No snapshot file.
    Missing,
    /// The snapshot must not be used; the reason is for logging.
    ///
    /// `listed` carries the project list when the check already fetched it.
    Stale {
        reason: String,
        listed: Option<Vec<String>>,
    },
    /// The snapshot is current.
    Fresh(Box<Workspace>),
}

/// Reads and writes the workspace snapshot file.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    path: PathBuf,
}

impl CacheStatus {
    fn stale(reason: impl Into<String>) -> Self {
        CacheStatus::Stale {
            reason: reason.into(),
            listed: None,
        }
    }
}

impl CacheStore {
    /// Creates a store for the workspace at `root` with its snapshot at `path`.
    pub fn new(root: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            path: path.into(),
        }
    }

    /// Returns the snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the snapshot without checking freshness.
    pub fn load(&self) -> Result<Option<CacheSnapshot>> {
        Ok(read_json_optional(&self.path)?)
    }

    /// Replaces the snapshot file.
    pub fn save(&self, snapshot: &CacheSnapshot) -> Result<()> {
        atomic_write_json(&self.path, snapshot)?;
        debug!(
            path = %self.path.display(),
            projects = snapshot.metadata.project_paths.len(),
            unsupported = snapshot.metadata.unsupported.len(),
            "workspace cache written"
        );
        Ok(())
    }

    /// Deletes the snapshot file. Returns false if there was none.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Decides whether the snapshot can stand in for a full resolution.
    ///
    /// Fresh means all of:
    /// - the snapshot file exists and parses, and its keys match its workspace
    /// - every recorded manifest still exists and is not newer than the
    ///   snapshot file
    /// - the build tool lists exactly the snapshot's projects plus its
    ///   unsupported names (after the `*.e2e` exclusion), in any order
    ///
    /// Only the last check invokes the build tool.
    pub async fn check(&self, client: &dyn NxClient) -> CacheStatus {
        let snapshot_mtime = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) if e.kind() == ErrorKind::NotFound => return CacheStatus::Missing,
            Err(e) => return CacheStatus::stale(format!("cannot stat snapshot: {}", e)),
        };

        let snapshot = match self.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return CacheStatus::Missing,
            Err(e) => return CacheStatus::stale(format!("unreadable snapshot: {}", e)),
        };

        if !snapshot.is_consistent() {
            return CacheStatus::stale("manifest keys do not match projects");
        }

        if let Some(reason) = self.changed_manifest(&snapshot, snapshot_mtime) {
            return CacheStatus::stale(reason);
        }

        let listed = match client.list_projects().await {
            Ok(names) => names,
            Err(e) => return CacheStatus::stale(format!("cannot list projects: {}", e)),
        };
        let parts = partition_names(listed.iter().map(String::as_str));
        let current: BTreeSet<&String> = parts.retained().collect();

        if current != snapshot.metadata.known_names() {
            return CacheStatus::Stale {
                reason: "project list changed".to_string(),
                listed: Some(listed),
            };
        }

        CacheStatus::Fresh(Box::new(snapshot.workspace))
    }

    fn changed_manifest(&self, snapshot: &CacheSnapshot, snapshot_mtime: SystemTime) -> Option<String> {
        for (name, path) in snapshot.metadata.manifests() {
            let Some(path) = path else { continue };
            let full = self.root.join(path);
            match fs::metadata(&full).and_then(|m| m.modified()) {
                Ok(mtime) if mtime > snapshot_mtime => {
                    return Some(format!("manifest of {} changed", name));
                }
                Ok(_) => {}
                Err(_) => return Some(format!("manifest of {} is gone", name)),
            }
        }
        None
    }
}

/// Locates a project's manifest by conventional layout.
///
/// Tries `<name>/`, `apps/<name>/`, `libs/<name>/` and finally the root the
/// build tool reported. Returns the path relative to `root`.
pub fn find_manifest(root: &Path, name: &str, reported_root: Option<&str>) -> Option<PathBuf> {
    let mut dirs = vec![PathBuf::from(name)];
    dirs.extend(PROJECT_FOLDERS.iter().map(|folder| Path::new(folder).join(name)));
    if let Some(reported) = reported_root {
        dirs.push(PathBuf::from(reported));
    }

    for dir in dirs {
        for file in MANIFEST_FILES {
            let candidate = dir.join(file);
            if root.join(&candidate).is_file() {
                return Some(candidate);
            }
        }
    }
    None
}
