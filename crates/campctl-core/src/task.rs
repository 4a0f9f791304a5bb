use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposeOperation {
    /// `up -d`, plus `--build` when the stack builds images
    Up,
    /// `down -v`
    Down,
    /// `logs -f`
    Logs,
}

impl fmt::Display for ComposeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeOperation::Up => write!(f, "up"),
            ComposeOperation::Down => write!(f, "down"),
            ComposeOperation::Logs => write!(f, "logs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskAction {
    Compose {
        stack: String,
        operation: ComposeOperation,
        /// Stack whose readiness gate must pass before the command is issued
        wait_for: Option<String>,
    },
    Bootstrap {
        repository: String,
    },
    Smoke,
    /// Only pulls its prerequisites into the plan.
    Aggregate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub name: String,
    pub group: String,
    pub description: String,
    pub depends_on: Vec<String>,
    pub run_after: Vec<String>,
    pub action: TaskAction,
}

impl TaskDescriptor {
    pub fn new(name: impl Into<String>, group: impl Into<String>, action: TaskAction) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            description: String::new(),
            depends_on: Vec::new(),
            run_after: Vec::new(),
            action,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn must_run_after<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_after = tasks.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self.action, TaskAction::Aggregate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub name: String,
    pub status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl TaskOutcome {
    pub fn started(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: TaskStatus::Succeeded,
            started_at: Some(Utc::now()),
            completed_at: None,
            error: None,
        }
    }

    pub fn skipped(name: &str, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: TaskStatus::Skipped,
            started_at: None,
            completed_at: None,
            error: Some(reason.into()),
        }
    }

    pub fn complete(mut self) -> Self {
        self.status = TaskStatus::Succeeded;
        self.completed_at = Some(Utc::now());
        self
    }

    pub fn fail(mut self, error: String) -> Self {
        self.status = TaskStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error = Some(error);
        self
    }
}
