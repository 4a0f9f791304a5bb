pub mod catalog;
pub mod engine;
pub mod error;
pub mod registry;
pub mod settings;
pub mod task;

// Re-exports
pub use catalog::{clone_task_name, standard_registry, standard_tasks};
pub use engine::{ActionRunner, ExecutionReport, TaskEngine};
pub use error::{Error, Result};
pub use registry::{ExecutionPlan, PlanStep, TaskRegistry};
pub use settings::{
    ComposeStack, Overlay, ReadinessSettings, ReadinessStrategy, RepositorySpec,
    ServiceEndpoint, Settings,
};
pub use task::{ComposeOperation, TaskAction, TaskDescriptor, TaskOutcome, TaskStatus};
