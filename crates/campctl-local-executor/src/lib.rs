mod error;

pub mod bootstrap;
pub mod compose;
pub mod git;
pub mod process;
pub mod readiness;
pub mod runner;
pub mod smoke;

pub use bootstrap::RepositoryBootstrapper;
pub use compose::ComposeOrchestrator;
pub use error::{LocalExecutorError, Result};
pub use git::GitManager;
pub use process::{CommandOutcome, CommandRunner, CommandSpec, SystemCommandRunner};
pub use readiness::{BackoffPolicy, ContainerHealthProbe, ReadinessGate, ReadinessProbe};
pub use runner::LocalActionRunner;
pub use smoke::{ServiceHealth, SmokeChecker};
