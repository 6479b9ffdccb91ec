//! Project and workspace types.
//!
//! A workspace is the set of projects the external build tool reports,
//! partitioned by kind. Both are immutable once the resolver hands them out.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a project in the monorepo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    /// Deployable application with a build output directory.
    Application,
    /// Library consumed by other projects.
    Library,
    /// End-to-end test project. Never probed individually.
    E2e,
}

impl ProjectKind {
    /// Returns the lowercase name used in files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Application => "application",
            ProjectKind::Library => "library",
            ProjectKind::E2e => "e2e",
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "application" | "app" => Ok(ProjectKind::Application),
            "library" | "lib" => Ok(ProjectKind::Library),
            "e2e" => Ok(ProjectKind::E2e),
            other => Err(format!("unknown project kind: {}", other)),
        }
    }
}

/// A project discovered in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project name as reported by the build tool.
    pub name: String,

    /// Classified kind.
    #[serde(rename = "type")]
    pub kind: ProjectKind,

    /// Build output path relative to the workspace root (applications only).
    #[serde(
        rename = "outputPath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub output_path: Option<String>,
}

impl Project {
    /// Creates an application with its declared build output path.
    pub fn application(name: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ProjectKind::Application,
            output_path: Some(output_path.into()),
        }
    }

    /// Creates a library.
    pub fn library(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ProjectKind::Library,
            output_path: None,
        }
    }

    /// Creates an end-to-end test project.
    pub fn e2e(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ProjectKind::E2e,
            output_path: None,
        }
    }
}

/// The discovered projects of a monorepo, partitioned by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Workspace name (the root directory name).
    pub name: String,
    /// Applications, sorted by name.
    #[serde(default)]
    pub applications: Vec<Project>,
    /// Libraries, sorted by name.
    #[serde(default)]
    pub libraries: Vec<Project>,
    /// End-to-end projects, sorted by name.
    #[serde(default)]
    pub e2e_apps: Vec<Project>,
}

impl Workspace {
    /// Creates an empty workspace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Total number of projects across all kinds.
    pub fn len(&self) -> usize {
        self.applications.len() + self.libraries.len() + self.e2e_apps.len()
    }

    /// Returns true if no projects were discovered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over every project: applications, then libraries, then e2e.
    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.applications
            .iter()
            .chain(self.libraries.iter())
            .chain(self.e2e_apps.iter())
    }

    /// Returns the names of every project in the workspace.
    pub fn project_names(&self) -> Vec<String> {
        self.iter().map(|p| p.name.clone()).collect()
    }

    /// Returns the projects of the requested kinds.
    ///
    /// Order is applications, libraries, e2e regardless of the order of `kinds`.
    /// An empty `kinds` slice yields nothing.
    pub fn projects(&self, kinds: &[ProjectKind]) -> Vec<Project> {
        self.iter()
            .filter(|p| kinds.contains(&p.kind))
            .cloned()
            .collect()
    }

    /// Finds a project by exact name.
    pub fn find(&self, name: &str) -> Option<&Project> {
        self.iter().find(|p| p.name == name)
    }
}
