use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task registered twice: {0}")]
    DuplicateTask(String),

    #[error("Task {task} refers to unknown task {dependency}")]
    UnknownDependency { task: String, dependency: String },

    #[error("Dependency cycle detected involving task: {0}")]
    DependencyCycle(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
