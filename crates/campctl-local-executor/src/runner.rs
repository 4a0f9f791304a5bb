use crate::bootstrap::RepositoryBootstrapper;
use crate::compose::ComposeOrchestrator;
use crate::error::Result;
use crate::git::GitManager;
use crate::process::{CommandRunner, SystemCommandRunner};
use crate::readiness::ReadinessGate;
use crate::smoke::SmokeChecker;
use async_trait::async_trait;
use campctl_core::{ActionRunner, Settings, TaskAction, TaskDescriptor};
use std::sync::Arc;

/// Executes task actions on the local machine.
pub struct LocalActionRunner {
    compose: ComposeOrchestrator,
    bootstrapper: RepositoryBootstrapper,
    smoke: SmokeChecker,
    gate: ReadinessGate,
}

impl LocalActionRunner {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let gate = ReadinessGate::from_settings(&settings.readiness)?;
        Self::with_parts(settings, Arc::new(SystemCommandRunner), gate)
    }

    /// Wire the runner around a specific command runner and readiness gate
    pub fn with_parts(
        settings: &Settings,
        commands: Arc<dyn CommandRunner>,
        gate: ReadinessGate,
    ) -> Result<Self> {
        let git = GitManager::new(&settings.repositories.git_program, commands.clone());

        Ok(Self {
            compose: ComposeOrchestrator::new(settings, commands),
            bootstrapper: RepositoryBootstrapper::new(settings, git),
            smoke: SmokeChecker::new(settings.services.clone())?,
            gate,
        })
    }
}

#[async_trait]
impl ActionRunner for LocalActionRunner {
    async fn run(&self, task: &TaskDescriptor) -> anyhow::Result<()> {
        match &task.action {
            TaskAction::Compose {
                stack,
                operation,
                wait_for,
            } => {
                if let Some(dependency) = wait_for {
                    self.gate.wait(dependency).await?;
                }
                self.compose.run(stack, *operation).await?;
            }
            TaskAction::Bootstrap { repository } => {
                self.bootstrapper.bootstrap(repository).await?;
            }
            TaskAction::Smoke => {
                self.smoke.check_all().await?;
            }
            TaskAction::Aggregate => {}
        }
        Ok(())
    }
}
