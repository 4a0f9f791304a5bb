use crate::{ExecutionPlan, Result, TaskDescriptor, TaskOutcome, TaskRegistry, TaskStatus};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Performs the side effect behind a task's action.
#[async_trait]
pub trait ActionRunner: Send + Sync {
    async fn run(&self, task: &TaskDescriptor) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct TaskEngine {
    registry: Arc<TaskRegistry>,
    runner: Arc<dyn ActionRunner>,
    continue_on_failure: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub run_id: Uuid,
    pub outcomes: Vec<TaskOutcome>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.status != TaskStatus::Failed)
    }

    pub fn failed(&self) -> Vec<&TaskOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Failed)
            .collect()
    }

    pub fn executed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.status != TaskStatus::Skipped)
            .map(|o| o.name.as_str())
            .collect()
    }

    pub fn outcome(&self, name: &str) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

impl TaskEngine {
    pub fn new(registry: Arc<TaskRegistry>, runner: Arc<dyn ActionRunner>) -> Self {
        Self {
            registry,
            runner,
            continue_on_failure: false,
        }
    }

    /// Keep running tasks that are not downstream of a failure
    pub fn with_continue_on_failure(mut self, continue_on_failure: bool) -> Self {
        self.continue_on_failure = continue_on_failure;
        self
    }

    pub fn plan<S: AsRef<str>>(&self, requested: &[S]) -> Result<ExecutionPlan> {
        self.registry.plan(requested)
    }

    /// Plan the requested tasks and run them one at a time.
    ///
    /// Task failures are recorded in the report rather than returned; only
    /// planning errors come back as `Err`.
    pub async fn run<S: AsRef<str>>(&self, requested: &[S]) -> Result<ExecutionReport> {
        let plan = self.plan(requested)?;
        Ok(self.execute(&plan).await)
    }

    pub async fn execute(&self, plan: &ExecutionPlan) -> ExecutionReport {
        let run_id = Uuid::new_v4();
        let mut outcomes = Vec::with_capacity(plan.len());
        let mut broken: HashSet<&str> = HashSet::new();
        let mut aborted_by: Option<String> = None;

        tracing::info!(
            %run_id,
            "Executing {} task(s): {:?}",
            plan.len(),
            plan.names()
        );

        for step in &plan.steps {
            let name = step.task.name.as_str();

            if let Some(failed) = &aborted_by {
                tracing::debug!("Skipping {} after failure of {}", name, failed);
                outcomes.push(TaskOutcome::skipped(
                    name,
                    format!("aborted after {} failed", failed),
                ));
                continue;
            }

            if let Some(upstream) = step.upstream.iter().find(|u| broken.contains(u.as_str())) {
                tracing::warn!("Skipping {}: upstream task {} did not succeed", name, upstream);
                outcomes.push(TaskOutcome::skipped(
                    name,
                    format!("upstream task {} did not succeed", upstream),
                ));
                broken.insert(name);
                continue;
            }

            let outcome = TaskOutcome::started(name);

            if step.task.is_aggregate() {
                tracing::info!("> {}", name);
                outcomes.push(outcome.complete());
                continue;
            }

            tracing::info!("> {}: {}", name, step.task.description);

            match self.runner.run(&step.task).await {
                Ok(()) => {
                    tracing::info!("Task completed: {}", name);
                    outcomes.push(outcome.complete());
                }
                Err(e) => {
                    tracing::error!("Task failed: {}: {:#}", name, e);
                    outcomes.push(outcome.fail(format!("{:#}", e)));
                    broken.insert(name);
                    if !self.continue_on_failure {
                        aborted_by = Some(name.to_string());
                    }
                }
            }
        }

        ExecutionReport { run_id, outcomes }
    }
}
