use crate::error::{LocalExecutorError, Result};
use crate::process::{CommandRunner, CommandSpec};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct GitManager {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl GitManager {
    pub fn new(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    pub fn clone_command(&self, url: &str, branch: &str, depth: u32, target_dir: &Path) -> CommandSpec {
        CommandSpec::new(&self.program)
            .args(["clone", "--branch", branch, "--single-branch"])
            .args(["--depth".to_string(), depth.to_string()])
            .arg(url)
            .arg(target_dir.to_string_lossy())
    }

    /// Single-branch clone of `branch`, truncated to `depth` commits
    pub async fn shallow_clone(
        &self,
        url: &str,
        branch: &str,
        depth: u32,
        target_dir: &Path,
    ) -> Result<()> {
        info!("Cloning repository {} ({}) to {:?}", url, branch, target_dir);

        let spec = self.clone_command(url, branch, depth, target_dir);

        self.runner
            .run_checked(&spec)
            .await
            .map_err(|e| LocalExecutorError::CloneFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        info!("Repository cloned successfully to {:?}", target_dir);

        Ok(())
    }
}
