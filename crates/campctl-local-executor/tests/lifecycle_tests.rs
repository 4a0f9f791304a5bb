mod common;

use async_trait::async_trait;
use campctl_core::{standard_registry, Settings, TaskEngine, TaskStatus};
use campctl_local_executor::{BackoffPolicy, LocalActionRunner, ReadinessGate, ReadinessProbe};
use common::{project, RecordingRunner};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const INFRA_UP: &str = "docker compose -f infra/docker-compose-infra.yml up -d";
const INFRA_DOWN: &str = "docker compose -f infra/docker-compose-infra.yml down -v";
const APPS_UP: &str = "docker compose -f infra/docker-compose.yml up -d --build";
const APPS_DOWN: &str = "docker compose -f infra/docker-compose.yml down -v";

fn engine(settings: &Settings, commands: Arc<RecordingRunner>, gate: ReadinessGate) -> TaskEngine {
    let registry = Arc::new(standard_registry(settings).unwrap());
    let runner = LocalActionRunner::with_parts(settings, commands, gate).unwrap();
    TaskEngine::new(registry, Arc::new(runner))
}

#[tokio::test(start_paused = true)]
async fn test_all_up_starts_infra_then_apps() {
    let commands = Arc::new(RecordingRunner::default());
    let engine = engine(
        &Settings::default(),
        commands.clone(),
        ReadinessGate::FixedDelay(Duration::from_secs(10)),
    );

    let report = engine.run(&["allUp"]).await.unwrap();

    assert!(report.is_success());
    assert_eq!(commands.rendered(), vec![INFRA_UP, APPS_UP]);
}

#[tokio::test]
async fn test_all_down_stops_apps_then_infra() {
    let commands = Arc::new(RecordingRunner::default());
    let engine = engine(&Settings::default(), commands.clone(), ReadinessGate::Immediate);

    let report = engine.run(&["allDown"]).await.unwrap();

    assert!(report.is_success());
    assert_eq!(commands.rendered(), vec![APPS_DOWN, INFRA_DOWN]);
}

#[tokio::test]
async fn test_compose_failure_stops_dependent_tasks() {
    let commands = Arc::new(RecordingRunner::failing_on("docker-compose-infra.yml up"));
    let engine = engine(&Settings::default(), commands.clone(), ReadinessGate::Immediate);

    let report = engine.run(&["allUp"]).await.unwrap();

    assert!(!report.is_success());
    assert_eq!(commands.rendered(), vec![INFRA_UP]);

    let infra = report.outcome("infraUp").unwrap();
    assert_eq!(infra.status, TaskStatus::Failed);
    assert!(infra.error.as_deref().unwrap().contains("status 1"));
    assert_eq!(report.outcome("appsUp").unwrap().status, TaskStatus::Skipped);
}

#[tokio::test(start_paused = true)]
async fn test_apps_up_alone_still_waits_the_fixed_delay() {
    let commands = Arc::new(RecordingRunner::default());
    let engine = engine(
        &Settings::default(),
        commands.clone(),
        ReadinessGate::FixedDelay(Duration::from_secs(10)),
    );
    let started = tokio::time::Instant::now();

    let report = engine.run(&["appsUp"]).await.unwrap();

    assert!(report.is_success());
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert_eq!(commands.rendered(), vec![APPS_UP]);
}

struct NeverReady {
    calls: AtomicU32,
}

#[async_trait]
impl ReadinessProbe for NeverReady {
    async fn is_ready(&self) -> campctl_local_executor::Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(false)
    }
}

#[tokio::test(start_paused = true)]
async fn test_apps_up_is_not_started_when_infra_never_becomes_ready() {
    let commands = Arc::new(RecordingRunner::default());
    let probe = Arc::new(NeverReady {
        calls: AtomicU32::new(0),
    });
    let gate = ReadinessGate::Poll {
        probe: probe.clone(),
        policy: BackoffPolicy {
            max_attempts: 2,
            initial: Duration::from_millis(500),
            max: Duration::from_secs(2),
        },
    };
    let engine = engine(&Settings::default(), commands.clone(), gate);

    let report = engine.run(&["appsUp"]).await.unwrap();

    let apps = report.outcome("appsUp").unwrap();
    assert_eq!(apps.status, TaskStatus::Failed);
    assert!(apps.error.as_deref().unwrap().contains("infra"));
    assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    assert!(commands.rendered().is_empty());
}

#[tokio::test]
async fn test_apps_logs_follows() {
    let commands = Arc::new(RecordingRunner::default());
    let engine = engine(&Settings::default(), commands.clone(), ReadinessGate::Immediate);

    engine.run(&["appsLogs"]).await.unwrap();

    assert_eq!(
        commands.rendered(),
        vec!["docker compose -f infra/docker-compose.yml logs -f"]
    );
}

#[tokio::test]
async fn test_clone_repos_clones_all_three() {
    let root = tempfile::tempdir().unwrap();
    let settings = project(root.path());
    let commands = Arc::new(RecordingRunner::default());
    let engine = engine(&settings, commands.clone(), ReadinessGate::Immediate);

    let report = engine.run(&["cloneRepos"]).await.unwrap();

    assert!(report.is_success());
    assert_eq!(commands.rendered().len(), 3);
    for name in ["kiosk", "admin", "reservation"] {
        let clone = root.path().join(format!("repos/atdd-camping-{}", name));
        assert!(clone.join("build.gradle").exists(), "{} not bootstrapped", name);
    }
}
