//! Concurrent project discovery.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use gonx_models::{Project, ProjectKind, Workspace};
use gonx_nx::{NxClient, NxError};

use crate::cache::{find_manifest, CacheSnapshot, CacheStatus, CacheStore};
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::partition::partition_names;

/// What a single probe task hands back.
#[derive(Debug)]
struct Probed {
    name: String,
    /// `None` when the build tool reports a type that is not tracked.
    project: Option<Project>,
    manifest: Option<PathBuf>,
}

/// Probe results split by whether they belong in the workspace.
#[derive(Debug, Default)]
struct Assembled {
    workspace: Workspace,
    manifests: BTreeMap<String, Option<PathBuf>>,
    unsupported: BTreeMap<String, Option<PathBuf>>,
}

/// Resolves the workspace at a fixed root.
pub struct WorkspaceResolver {
    root: PathBuf,
    client: Arc<dyn NxClient>,
    config: ResolverConfig,
    cache: CacheStore,
}

impl WorkspaceResolver {
    /// Creates a resolver for `root`, talking to the build tool through `client`.
    pub fn new(root: impl Into<PathBuf>, client: Arc<dyn NxClient>, config: ResolverConfig) -> Self {
        let root = root.into();
        let cache = CacheStore::new(&root, &config.cache_path);
        Self {
            root,
            client,
            config,
            cache,
        }
    }

    /// Workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The snapshot store this resolver reads and writes.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Produces the current workspace.
    ///
    /// # Errors
    ///
    /// Fails only if the project list cannot be obtained. Individual probe
    /// failures drop the project and are logged.
    pub async fn resolve(&self) -> Result<Workspace> {
        let mut listed = None;
        if self.config.use_cache {
            match self.cache.check(self.client.as_ref()).await {
                CacheStatus::Fresh(workspace) => {
                    debug!(projects = workspace.len(), "workspace cache is fresh");
                    return Ok(*workspace);
                }
                CacheStatus::Stale { reason, listed: names } => {
                    debug!(%reason, "workspace cache is stale");
                    listed = names;
                }
                CacheStatus::Missing => debug!("no workspace cache"),
            }
        }

        let names = match listed {
            Some(names) => names,
            None => self.client.list_projects().await?,
        };
        let parts = partition_names(names);
        debug!(
            to_probe = parts.to_probe.len(),
            e2e = parts.e2e.len(),
            excluded = parts.excluded.len(),
            "partitioned project list"
        );

        let probed = self.probe_all(parts.to_probe, parts.e2e).await;
        let Assembled {
            workspace,
            manifests,
            unsupported,
        } = self.assemble(probed);
        info!(
            applications = workspace.applications.len(),
            libraries = workspace.libraries.len(),
            e2e = workspace.e2e_apps.len(),
            unsupported = unsupported.len(),
            "workspace resolved"
        );

        let snapshot = CacheSnapshot::new(workspace, manifests).with_unsupported(unsupported);
        if let Err(e) = self.cache.save(&snapshot) {
            warn!(error = %e, path = %self.cache.path().display(), "failed to write workspace cache");
        }

        Ok(snapshot.workspace)
    }

    /// Runs every probe under the concurrency bound and collects the
    /// successful ones. Each task owns its result; nothing is shared.
    async fn probe_all(&self, to_probe: Vec<String>, e2e: Vec<String>) -> Vec<Probed> {
        let gate = Arc::new(Semaphore::new(self.config.max_concurrent_probes));
        let mut tasks = JoinSet::new();

        let jobs = to_probe
            .into_iter()
            .map(|name| (name, false))
            .chain(e2e.into_iter().map(|name| (name, true)));

        for (name, is_e2e) in jobs {
            let gate = Arc::clone(&gate);
            let client = Arc::clone(&self.client);
            let root = self.root.clone();
            tasks.spawn(async move {
                let _permit = gate.acquire_owned().await.ok();
                let result = if is_e2e {
                    Ok(probe_e2e(&root, client.as_ref(), &name).await)
                } else {
                    probe_project(&root, client.as_ref(), &name).await
                };
                (name, result)
            });
        }

        let mut probed = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(found))) => probed.push(found),
                Ok((name, Err(e))) => warn!(project = %name, error = %e, "failed to probe project"),
                Err(e) => warn!(error = %e, "probe task aborted"),
            }
        }
        probed
    }

    fn assemble(&self, mut probed: Vec<Probed>) -> Assembled {
        probed.sort_by(|a, b| a.name.cmp(&b.name));

        let mut out = Assembled {
            workspace: Workspace::new(workspace_name(&self.root)),
            ..Assembled::default()
        };
        for Probed {
            name,
            project,
            manifest,
        } in probed
        {
            let Some(project) = project else {
                debug!(project = %name, "skipping unsupported project type");
                out.unsupported.insert(name, manifest);
                continue;
            };
            out.manifests.insert(name, manifest);
            match project.kind {
                ProjectKind::Application => out.workspace.applications.push(project),
                ProjectKind::Library => out.workspace.libraries.push(project),
                ProjectKind::E2e => out.workspace.e2e_apps.push(project),
            }
        }
        out
    }
}

/// Describes one project. Untracked project types come back without a
/// project but still with their manifest.
async fn probe_project(
    root: &Path,
    client: &dyn NxClient,
    name: &str,
) -> std::result::Result<Probed, NxError> {
    let description = client.describe_project(name).await?;
    let project = description.kind.map(|kind| Project {
        name: name.to_string(),
        kind,
        output_path: match kind {
            ProjectKind::Application => description.output_path.clone(),
            _ => None,
        },
    });
    let manifest = find_manifest(root, name, description.root.as_deref());
    Ok(Probed {
        name: name.to_string(),
        project,
        manifest,
    })
}

/// End-to-end projects are never classified by the build tool; it is asked
/// for the project root only when the conventional layouts miss.
async fn probe_e2e(root: &Path, client: &dyn NxClient, name: &str) -> Probed {
    let mut manifest = find_manifest(root, name, None);
    if manifest.is_none() {
        match client.describe_project(name).await {
            Ok(description) => manifest = find_manifest(root, name, description.root.as_deref()),
            Err(e) => debug!(project = %name, error = %e, "no manifest for e2e project"),
        }
    }
    Probed {
        name: name.to_string(),
        project: Some(Project::e2e(name)),
        manifest,
    }
}

fn workspace_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}
