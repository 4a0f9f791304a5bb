mod common;

use campctl_local_executor::{GitManager, LocalExecutorError, RepositoryBootstrapper};
use common::{project, RecordingRunner};
use std::sync::Arc;

fn bootstrapper(settings: &campctl_core::Settings, runner: Arc<RecordingRunner>) -> RepositoryBootstrapper {
    let git = GitManager::new("git", runner);
    RepositoryBootstrapper::new(settings, git)
}

#[tokio::test]
async fn test_clone_kiosk_applies_overlays() {
    let root = tempfile::tempdir().unwrap();
    let settings = project(root.path());
    let runner = Arc::new(RecordingRunner::default());

    let target = bootstrapper(&settings, runner.clone())
        .bootstrap("kiosk")
        .await
        .unwrap();

    assert_eq!(target, root.path().join("repos/atdd-camping-kiosk"));

    let application =
        std::fs::read_to_string(target.join("src/main/resources/application.yml")).unwrap();
    assert!(application.contains("name: kiosk"));

    let build = std::fs::read_to_string(target.join("build.gradle")).unwrap();
    assert_eq!(build, "// kiosk build overlay\n");

    let calls = runner.rendered();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with(
        "git clone --branch main --single-branch --depth 1 \
         https://github.com/next-step/atdd-camping-kiosk.git"
    ));
}

#[tokio::test]
async fn test_bootstrap_twice_leaves_one_fresh_clone() {
    let root = tempfile::tempdir().unwrap();
    let settings = project(root.path());
    let runner = Arc::new(RecordingRunner::default());
    let bootstrapper = bootstrapper(&settings, runner.clone());

    let target = bootstrapper.bootstrap("admin").await.unwrap();
    std::fs::write(target.join("leftover.txt"), "from the first run").unwrap();

    let again = bootstrapper.bootstrap("admin").await.unwrap();

    assert_eq!(target, again);
    assert!(!again.join("leftover.txt").exists());
    assert!(again.join("build.gradle").exists());

    let clones: Vec<_> = std::fs::read_dir(root.path().join("repos"))
        .unwrap()
        .collect();
    assert_eq!(clones.len(), 1);
    assert_eq!(runner.rendered().len(), 2);
}

#[tokio::test]
async fn test_clone_failure_skips_overlays() {
    let root = tempfile::tempdir().unwrap();
    let settings = project(root.path());
    let runner = Arc::new(RecordingRunner::failing_on("git clone"));

    let err = bootstrapper(&settings, runner)
        .bootstrap("reservation")
        .await
        .unwrap_err();

    assert!(matches!(err, LocalExecutorError::CloneFailed { .. }));

    let target = root.path().join("repos/atdd-camping-reservation");
    assert!(!target.join("build.gradle").exists());
    assert!(!target
        .join("src/main/resources/application.yml")
        .exists());
}

#[tokio::test]
async fn test_missing_overlay_source_is_distinct_from_clone_failure() {
    let root = tempfile::tempdir().unwrap();
    let settings = project(root.path());
    std::fs::remove_file(root.path().join("infra/configs/kiosk-build.gradle")).unwrap();
    let runner = Arc::new(RecordingRunner::default());

    let err = bootstrapper(&settings, runner.clone())
        .bootstrap("kiosk")
        .await
        .unwrap_err();

    match err {
        LocalExecutorError::OverlaySourceMissing(path) => {
            assert!(path.ends_with("infra/configs/kiosk-build.gradle"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // The clone itself went through
    assert_eq!(runner.rendered().len(), 1);
}

#[tokio::test]
async fn test_unknown_repository() {
    let root = tempfile::tempdir().unwrap();
    let settings = project(root.path());
    let runner = Arc::new(RecordingRunner::default());

    let err = bootstrapper(&settings, runner.clone())
        .bootstrap("billing")
        .await
        .unwrap_err();

    assert!(matches!(err, LocalExecutorError::UnknownRepository(name) if name == "billing"));
    assert!(runner.rendered().is_empty());
}

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &std::path::Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args(["-c", "user.name=campctl", "-c", "user.email=campctl@example.com"])
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {:?} failed", args);
}

#[tokio::test]
async fn test_real_shallow_clone_from_local_repository() {
    if !git_available() {
        eprintln!("skip: git not installed");
        return;
    }

    let upstream = tempfile::tempdir().unwrap();
    git(upstream.path(), &["init", "-q"]);
    git(upstream.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
    std::fs::write(upstream.path().join("README.md"), "kiosk").unwrap();
    git(upstream.path(), &["add", "README.md"]);
    git(upstream.path(), &["commit", "-q", "-m", "first"]);
    std::fs::write(upstream.path().join("README.md"), "kiosk v2").unwrap();
    git(upstream.path(), &["commit", "-q", "-am", "second"]);

    let root = tempfile::tempdir().unwrap();
    let mut settings = project(root.path());
    settings.repositories.entries[0].url =
        Some(format!("file://{}", upstream.path().display()));

    let git_manager = GitManager::new("git", Arc::new(campctl_local_executor::SystemCommandRunner));
    let bootstrapper = RepositoryBootstrapper::new(&settings, git_manager);

    let target = bootstrapper.bootstrap("kiosk").await.unwrap();
    let again = bootstrapper.bootstrap("kiosk").await.unwrap();
    assert_eq!(target, again);

    assert_eq!(std::fs::read_to_string(target.join("README.md")).unwrap(), "kiosk v2");
    assert!(target.join("src/main/resources/application.yml").exists());
    assert!(target.join("build.gradle").exists());

    // depth 1: only the tip commit is present
    let log = std::process::Command::new("git")
        .args(["rev-list", "--count", "HEAD"])
        .current_dir(&target)
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&log.stdout).trim(), "1");
}
