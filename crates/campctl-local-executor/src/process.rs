use crate::error::{LocalExecutorError, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// An external command, described before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit code of a finished command; `None` when killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    pub code: Option<i32>,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome>;

    /// Run and turn a non-zero exit into `CommandFailed`
    async fn run_checked(&self, spec: &CommandSpec) -> Result<()> {
        let outcome = self.run(spec).await?;
        if outcome.success() {
            Ok(())
        } else {
            Err(LocalExecutorError::CommandFailed {
                command: spec.to_string(),
                code: outcome.code,
            })
        }
    }
}

/// Spawns real processes with inherited stdio, so the operator sees the
/// tool's own output (and `logs -f` streams until interrupted).
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome> {
        debug!("Running: {}", spec);

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        let status = command
            .status()
            .await
            .map_err(|source| LocalExecutorError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        debug!("`{}` finished with {:?}", spec, status.code());

        Ok(CommandOutcome {
            code: status.code(),
        })
    }
}
