use crate::error::{LocalExecutorError, Result};
use crate::process::{CommandRunner, CommandSpec};
use campctl_core::{ComposeOperation, ComposeStack, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Issues Docker Compose commands against the configured stacks.
pub struct ComposeOrchestrator {
    program: Vec<String>,
    root: PathBuf,
    stacks: Vec<ComposeStack>,
    runner: Arc<dyn CommandRunner>,
}

impl ComposeOrchestrator {
    pub fn new(settings: &Settings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: settings.compose.program.clone(),
            root: settings.root.clone(),
            stacks: settings.compose.stacks.clone(),
            runner,
        }
    }

    fn stack(&self, name: &str) -> Result<&ComposeStack> {
        self.stacks
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| LocalExecutorError::UnknownStack(name.to_string()))
    }

    /// The exact command an operation maps to
    pub fn command(&self, stack: &str, operation: ComposeOperation) -> Result<CommandSpec> {
        let stack = self.stack(stack)?;

        let (program, leading) = match self.program.split_first() {
            Some((program, rest)) => (program.clone(), rest.to_vec()),
            None => ("docker".to_string(), vec!["compose".to_string()]),
        };

        let spec = CommandSpec::new(program)
            .args(leading)
            .arg("-f")
            .arg(stack.file.to_string_lossy())
            .current_dir(&self.root);

        let spec = match operation {
            ComposeOperation::Up => {
                let spec = spec.args(["up", "-d"]);
                if stack.build {
                    spec.arg("--build")
                } else {
                    spec
                }
            }
            ComposeOperation::Down => spec.args(["down", "-v"]),
            ComposeOperation::Logs => spec.args(["logs", "-f"]),
        };

        Ok(spec)
    }

    pub async fn run(&self, stack: &str, operation: ComposeOperation) -> Result<()> {
        let spec = self.command(stack, operation)?;
        info!("Compose {} on stack {}: {}", operation, stack, spec);
        self.runner.run_checked(&spec).await
    }

    pub async fn up(&self, stack: &str) -> Result<()> {
        self.run(stack, ComposeOperation::Up).await
    }

    pub async fn down(&self, stack: &str) -> Result<()> {
        self.run(stack, ComposeOperation::Down).await
    }

    pub async fn logs(&self, stack: &str) -> Result<()> {
        self.run(stack, ComposeOperation::Logs).await
    }
}
