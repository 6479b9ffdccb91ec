//! Resolver behaviour against a scripted build tool.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use gonx_models::ProjectKind;
use gonx_nx::{CancellationToken, CommandOutcome, NxClient, NxCommand, NxError, ProjectDescription};
use gonx_workspace::{CacheStatus, ResolverConfig, WorkspaceError, WorkspaceResolver};

#[derive(Default)]
struct FakeNx {
    projects: Mutex<Vec<String>>,
    descriptions: Mutex<HashMap<String, ProjectDescription>>,
    broken: Mutex<HashSet<String>>,
    fail_list: Mutex<bool>,
    probe_delay: Option<Duration>,
    list_calls: AtomicUsize,
    describe_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeNx {
    fn new() -> Self {
        Self::default()
    }

    fn with_delay(delay: Duration) -> Self {
        Self {
            probe_delay: Some(delay),
            ..Self::default()
        }
    }

    fn add(&self, name: &str, kind: Option<ProjectKind>, root: &str, output: Option<&str>) {
        self.projects.lock().unwrap().push(name.to_string());
        self.descriptions.lock().unwrap().insert(
            name.to_string(),
            ProjectDescription {
                kind,
                root: Some(root.to_string()),
                output_path: output.map(str::to_string),
            },
        );
    }

    fn add_unlisted_description(&self, name: &str, root: &str) {
        self.descriptions.lock().unwrap().insert(
            name.to_string(),
            ProjectDescription {
                kind: None,
                root: Some(root.to_string()),
                output_path: None,
            },
        );
    }

    fn list_only(&self, name: &str) {
        self.projects.lock().unwrap().push(name.to_string());
    }

    fn remove(&self, name: &str) {
        self.projects.lock().unwrap().retain(|p| p != name);
    }

    fn break_probe(&self, name: &str) {
        self.broken.lock().unwrap().insert(name.to_string());
    }

    fn describes(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NxClient for FakeNx {
    async fn list_projects(&self) -> gonx_nx::Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_list.lock().unwrap() {
            return Err(NxError::CommandFailed {
                command: "nx show projects".to_string(),
                status: "exit status: 1".to_string(),
                output: "no workspace".to_string(),
            });
        }
        Ok(self.projects.lock().unwrap().clone())
    }

    async fn describe_project(&self, name: &str) -> gonx_nx::Result<ProjectDescription> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.probe_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.broken.lock().unwrap().contains(name) {
            return Err(NxError::ParseError {
                command: format!("nx show project {} --json", name),
                reason: "unexpected token".to_string(),
            });
        }
        self.descriptions
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| NxError::CommandFailed {
                command: format!("nx show project {} --json", name),
                status: "exit status: 1".to_string(),
                output: format!("Cannot find project '{}'", name),
            })
    }

    async fn run(
        &self,
        command: &NxCommand,
        _cancel: &CancellationToken,
    ) -> gonx_nx::Result<CommandOutcome> {
        panic!("resolver must not run {}", command);
    }
}

fn write_manifest(root: &Path, dir: &str) {
    fs::create_dir_all(root.join(dir)).unwrap();
    fs::write(root.join(dir).join("project.json"), "{}").unwrap();
}

/// A repo with one app, one lib and an e2e project, each with a manifest.
fn standard_repo(root: &Path) -> Arc<FakeNx> {
    write_manifest(root, "apps/shop");
    write_manifest(root, "libs/ui");
    write_manifest(root, "apps/shop-e2e");

    let nx = Arc::new(FakeNx::new());
    nx.add(
        "shop",
        Some(ProjectKind::Application),
        "apps/shop",
        Some("dist/apps/shop"),
    );
    nx.add("ui", Some(ProjectKind::Library), "libs/ui", None);
    nx.list_only("shop-e2e");
    nx.list_only("shop.e2e");
    nx
}

fn resolver(root: &Path, nx: Arc<FakeNx>) -> WorkspaceResolver {
    WorkspaceResolver::new(root, nx, ResolverConfig::new(root))
}

#[tokio::test]
async fn test_full_resolution_classifies_projects() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());

    let workspace = resolver(dir.path(), nx.clone()).resolve().await.unwrap();

    assert_eq!(workspace.applications.len(), 1);
    assert_eq!(workspace.applications[0].name, "shop");
    assert_eq!(
        workspace.applications[0].output_path.as_deref(),
        Some("dist/apps/shop")
    );
    assert_eq!(workspace.libraries.len(), 1);
    assert_eq!(workspace.libraries[0].name, "ui");
    assert_eq!(workspace.e2e_apps.len(), 1);
    assert_eq!(workspace.e2e_apps[0].name, "shop-e2e");
    assert!(workspace.find("shop.e2e").is_none());

    // shop and ui probed; the e2e manifest was found by convention
    assert_eq!(nx.describes(), 2);
}

#[tokio::test]
async fn test_fresh_cache_skips_probes() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());
    let resolver = resolver(dir.path(), nx.clone());

    let first = resolver.resolve().await.unwrap();
    let describes = nx.describes();

    let second = resolver.resolve().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(nx.describes(), describes);
    assert!(matches!(
        resolver.cache().check(nx.as_ref()).await,
        CacheStatus::Fresh(_)
    ));
}

#[tokio::test]
async fn test_touched_manifest_forces_reprobe() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());
    let resolver = resolver(dir.path(), nx.clone());

    resolver.resolve().await.unwrap();
    let describes = nx.describes();

    let manifest = File::options()
        .write(true)
        .open(dir.path().join("libs/ui/project.json"))
        .unwrap();
    manifest
        .set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();

    resolver.resolve().await.unwrap();
    assert_eq!(nx.describes(), describes + 2);
}

#[tokio::test]
async fn test_deleted_manifest_forces_reprobe() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());
    let resolver = resolver(dir.path(), nx.clone());

    resolver.resolve().await.unwrap();
    fs::remove_file(dir.path().join("apps/shop-e2e/project.json")).unwrap();

    let status = resolver.cache().check(nx.as_ref()).await;
    assert!(matches!(status, CacheStatus::Stale { listed: None, .. }));
}

#[tokio::test]
async fn test_project_set_change_forces_reprobe() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());
    let resolver = resolver(dir.path(), nx.clone());

    resolver.resolve().await.unwrap();

    write_manifest(dir.path(), "libs/data");
    nx.add("data", Some(ProjectKind::Library), "libs/data", None);
    let describes = nx.describes();
    let lists = nx.lists();
    let workspace = resolver.resolve().await.unwrap();
    assert_eq!(nx.describes(), describes + 3);
    // the list fetched by the freshness check is reused
    assert_eq!(nx.lists(), lists + 1);
    assert!(workspace.find("data").is_some());

    nx.remove("ui");
    let describes = nx.describes();
    let workspace = resolver.resolve().await.unwrap();
    assert_eq!(nx.describes(), describes + 2);
    assert!(workspace.find("ui").is_none());
}

#[tokio::test]
async fn test_excluded_names_do_not_invalidate_cache() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());
    let resolver = resolver(dir.path(), nx.clone());

    resolver.resolve().await.unwrap();
    nx.list_only("admin.e2e");

    assert!(matches!(
        resolver.cache().check(nx.as_ref()).await,
        CacheStatus::Fresh(_)
    ));
}

#[tokio::test]
async fn test_probe_failure_drops_only_that_project() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());
    nx.break_probe("ui");

    let workspace = resolver(dir.path(), nx.clone()).resolve().await.unwrap();

    assert!(workspace.find("shop").is_some());
    assert!(workspace.find("shop-e2e").is_some());
    assert!(workspace.find("ui").is_none());
}

#[tokio::test]
async fn test_failed_probe_is_retried_next_time() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());
    nx.break_probe("ui");
    let resolver = resolver(dir.path(), nx.clone());

    resolver.resolve().await.unwrap();
    nx.broken.lock().unwrap().clear();

    let workspace = resolver.resolve().await.unwrap();
    assert!(workspace.find("ui").is_some());
}

#[tokio::test]
async fn test_unsupported_project_type_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());
    nx.add("tools", None, "tools", None);

    let workspace = resolver(dir.path(), nx).resolve().await.unwrap();
    assert!(workspace.find("tools").is_none());
    assert_eq!(workspace.len(), 3);
}

#[tokio::test]
async fn test_unsupported_project_keeps_cache_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());
    write_manifest(dir.path(), "tools");
    nx.add("tools", None, "tools", None);
    let resolver = resolver(dir.path(), nx.clone());

    resolver.resolve().await.unwrap();
    let describes = nx.describes();
    assert_eq!(describes, 3);

    let workspace = resolver.resolve().await.unwrap();
    assert_eq!(nx.describes(), describes);
    assert!(workspace.find("tools").is_none());

    let snapshot = resolver.cache().load().unwrap().unwrap();
    assert!(!snapshot.metadata.project_paths.contains_key("tools"));
    assert_eq!(
        snapshot.metadata.unsupported["tools"].as_deref(),
        Some(Path::new("tools/project.json"))
    );
}

#[tokio::test]
async fn test_unsupported_project_manifest_change_forces_reprobe() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());
    write_manifest(dir.path(), "tools");
    nx.add("tools", None, "tools", None);
    let resolver = resolver(dir.path(), nx.clone());

    resolver.resolve().await.unwrap();
    File::options()
        .write(true)
        .open(dir.path().join("tools/project.json"))
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
    nx.add("tools", Some(ProjectKind::Library), "tools", None);

    let describes = nx.describes();
    let workspace = resolver.resolve().await.unwrap();
    assert_eq!(nx.describes(), describes + 3);
    assert!(workspace.find("tools").is_some());
}

#[tokio::test]
async fn test_list_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());
    *nx.fail_list.lock().unwrap() = true;

    let err = resolver(dir.path(), nx).resolve().await.unwrap_err();
    assert!(matches!(err, WorkspaceError::Nx(NxError::CommandFailed { .. })));
}

#[tokio::test]
async fn test_empty_workspace_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let nx = Arc::new(FakeNx::new());

    let workspace = resolver(dir.path(), nx).resolve().await.unwrap();
    assert!(workspace.is_empty());
}

#[tokio::test]
async fn test_e2e_manifest_from_reported_root() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "tests/checkout-e2e");

    let nx = Arc::new(FakeNx::new());
    nx.list_only("checkout-e2e");
    nx.add_unlisted_description("checkout-e2e", "tests/checkout-e2e");
    let resolver = resolver(dir.path(), nx.clone());

    resolver.resolve().await.unwrap();
    assert_eq!(nx.describes(), 1);

    let snapshot = resolver.cache().load().unwrap().unwrap();
    assert_eq!(
        snapshot.metadata.project_paths["checkout-e2e"].as_deref(),
        Some(Path::new("tests/checkout-e2e/project.json"))
    );
}

#[tokio::test]
async fn test_cache_disabled_always_probes() {
    let dir = tempfile::tempdir().unwrap();
    let nx = standard_repo(dir.path());
    let config = ResolverConfig::new(dir.path()).with_cache(false);
    let resolver = WorkspaceResolver::new(dir.path(), nx.clone(), config);

    resolver.resolve().await.unwrap();
    resolver.resolve().await.unwrap();
    assert_eq!(nx.describes(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_probe_concurrency_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let nx = Arc::new(FakeNx::with_delay(Duration::from_millis(20)));
    for i in 0..12 {
        nx.add(&format!("lib{:02}", i), Some(ProjectKind::Library), "libs", None);
    }

    let config = ResolverConfig::new(dir.path()).with_max_concurrent_probes(3);
    let workspace = WorkspaceResolver::new(dir.path(), nx.clone(), config)
        .resolve()
        .await
        .unwrap();

    assert_eq!(workspace.libraries.len(), 12);
    assert_eq!(workspace.libraries[0].name, "lib00");
    assert_eq!(workspace.libraries[11].name, "lib11");
    assert!(nx.max_in_flight.load(Ordering::SeqCst) <= 3);
    assert!(nx.max_in_flight.load(Ordering::SeqCst) >= 2);
}
