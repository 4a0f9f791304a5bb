use crate::error::{LocalExecutorError, Result};
use crate::git::GitManager;
use campctl_core::{RepositorySpec, Settings};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Clones the sibling repositories and overlays local configuration into them.
pub struct RepositoryBootstrapper {
    root: PathBuf,
    repos_dir: PathBuf,
    base_url: String,
    branch: String,
    depth: u32,
    repositories: Vec<RepositorySpec>,
    git: GitManager,
}

impl RepositoryBootstrapper {
    pub fn new(settings: &Settings, git: GitManager) -> Self {
        Self {
            root: settings.root.clone(),
            repos_dir: settings.repos_dir(),
            base_url: settings.repositories.base_url.clone(),
            branch: settings.repositories.branch.clone(),
            depth: settings.repositories.depth,
            repositories: settings.repositories.entries.clone(),
            git,
        }
    }

    pub fn repository(&self, name: &str) -> Result<&RepositorySpec> {
        self.repositories
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| LocalExecutorError::UnknownRepository(name.to_string()))
    }

    pub fn target_dir(&self, spec: &RepositorySpec) -> PathBuf {
        self.repos_dir.join(&spec.directory)
    }

    /// Delete any previous clone, clone afresh, then copy the overlays.
    ///
    /// Overlays are only touched once the clone succeeded.
    pub async fn bootstrap(&self, name: &str) -> Result<PathBuf> {
        let spec = self.repository(name)?;
        let target = self.target_dir(spec);

        if fs::try_exists(&target).await? {
            info!("Removing previous clone at {:?}", target);
            fs::remove_dir_all(&target).await?;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let url = spec.clone_url(&self.base_url);
        self.git
            .shallow_clone(&url, spec.branch(&self.branch), self.depth, &target)
            .await?;

        for overlay in &spec.overlays {
            let from = self.root.join(&overlay.source);
            let to = target.join(&overlay.destination);
            copy_overlay(&from, &to).await?;
        }

        info!(
            "Bootstrapped {} with {} overlay(s) at {:?}",
            spec.name,
            spec.overlays.len(),
            target
        );

        Ok(target)
    }
}

async fn copy_overlay(from: &Path, to: &Path) -> Result<()> {
    if !fs::try_exists(from).await? {
        return Err(LocalExecutorError::OverlaySourceMissing(from.to_path_buf()));
    }

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| LocalExecutorError::OverlayCopy {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source,
            })?;
    }

    fs::copy(from, to)
        .await
        .map_err(|source| LocalExecutorError::OverlayCopy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })?;

    debug!("Overlay copied: {:?} -> {:?}", from, to);

    Ok(())
}
