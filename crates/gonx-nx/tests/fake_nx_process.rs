//! Runs NxCli against a shell script standing in for the nx binary.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use gonx_models::ProjectKind;
use gonx_nx::{CancellationToken, NxCli, NxClient, NxCommand, NxError};

const FAKE_NX: &str = r#"#!/bin/sh
case "$1" in
  show)
    if [ "$2" = "projects" ]; then
      printf 'shop\nui\n\n'
      exit 0
    fi
    if [ "$3" = "broken" ]; then
      echo "Cannot find project 'broken'" >&2
      exit 1
    fi
    printf '{"root":"apps/%s","projectType":"application","targets":{"build":{"options":{"outputPath":"dist/apps/%s"}}}}' "$3" "$3"
    ;;
  build)
    if [ "$2" = "slow" ]; then
      sleep 30
    fi
    echo "built $2 daemon=$NX_DAEMON"
    ;;
  lint)
    echo "linting $2"
    echo "2 problems" >&2
    exit 1
    ;;
  reset)
    ;;
esac
"#;

fn install_fake_nx(dir: &Path) -> PathBuf {
    let path = dir.join("nx");
    fs::write(&path, FAKE_NX).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

// One test drives every scenario so the script is written exactly once
// before any process is spawned.
#[tokio::test]
async fn test_nx_cli_against_fake_binary() {
    let dir = tempfile::tempdir().unwrap();
    let program = install_fake_nx(dir.path());
    let cli = NxCli::with_program(dir.path(), program);
    let cancel = CancellationToken::new();

    // list-projects
    let projects = cli.list_projects().await.unwrap();
    assert_eq!(projects, vec!["shop", "ui"]);

    // describe-project
    let desc = cli.describe_project("shop").await.unwrap();
    assert_eq!(desc.kind, Some(ProjectKind::Application));
    assert_eq!(desc.output_path.as_deref(), Some("dist/apps/shop"));

    let err = cli.describe_project("broken").await.unwrap_err();
    match err {
        NxError::CommandFailed { output, .. } => assert!(output.contains("Cannot find project")),
        other => panic!("unexpected error: {other}"),
    }

    // successful run carries output and the daemon override
    let outcome = cli
        .run(&NxCommand::Build("shop".into()), &cancel)
        .await
        .unwrap();
    assert!(outcome.output.contains("built shop daemon=false"));

    // failing run embeds stdout and stderr
    let err = cli
        .run(&NxCommand::Lint("ui".into()), &cancel)
        .await
        .unwrap_err();
    match err {
        NxError::CommandFailed { command, output, .. } => {
            assert_eq!(command, "nx lint ui");
            assert!(output.contains("linting ui"));
            assert!(output.contains("2 problems"));
        }
        other => panic!("unexpected error: {other}"),
    }

    cli.run(&NxCommand::Reset, &cancel).await.unwrap();

    // cancellation kills a long-running child
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = cli
        .run(&NxCommand::Build("slow".into()), &token)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(10));
}
