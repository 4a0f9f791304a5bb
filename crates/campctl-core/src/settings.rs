use crate::catalog::{APPS_STACK, INFRA_STACK};
use crate::{Error, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "campctl.toml";
pub const ENV_PREFIX: &str = "CAMPCTL";

/// Everything one invocation needs to know about the project layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Project root; compose files, overlay sources and `repos/` are relative to it
    pub root: PathBuf,
    pub compose: ComposeSettings,
    pub readiness: ReadinessSettings,
    pub repositories: RepositorySettings,
    pub services: Vec<ServiceEndpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeSettings {
    /// Program and leading arguments, e.g. `["docker", "compose"]`
    pub program: Vec<String>,
    pub stacks: Vec<ComposeStack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeStack {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub file: PathBuf,
    #[serde(default)]
    pub build: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadinessStrategy {
    None,
    FixedDelay,
    ContainerHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessSettings {
    pub strategy: ReadinessStrategy,
    pub delay_secs: u64,
    /// Containers polled by the `container-health` strategy
    pub containers: Vec<String>,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    /// Directory (under `root`) that receives the clones
    pub directory: PathBuf,
    pub base_url: String,
    pub branch: String,
    pub depth: u32,
    pub git_program: String,
    pub entries: Vec<RepositorySpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySpec {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    pub directory: PathBuf,
    #[serde(default)]
    pub overlays: Vec<Overlay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    /// Relative to the project root
    pub source: PathBuf,
    /// Relative to the clone, including the new file name
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

fn default_health_path() -> String {
    "/".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            compose: ComposeSettings::default(),
            readiness: ReadinessSettings::default(),
            repositories: RepositorySettings::default(),
            services: default_services(),
        }
    }
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            program: vec!["docker".to_string(), "compose".to_string()],
            stacks: vec![
                ComposeStack {
                    name: "infra".to_string(),
                    description: "infra-only stack".to_string(),
                    file: PathBuf::from("infra/docker-compose-infra.yml"),
                    build: false,
                },
                ComposeStack {
                    name: "apps".to_string(),
                    description: "kiosk full stack".to_string(),
                    file: PathBuf::from("infra/docker-compose.yml"),
                    build: true,
                },
            ],
        }
    }
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            strategy: ReadinessStrategy::FixedDelay,
            delay_secs: 10,
            containers: Vec::new(),
            max_attempts: 10,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("repos"),
            base_url: "https://github.com/next-step".to_string(),
            branch: "main".to_string(),
            depth: 1,
            git_program: "git".to_string(),
            entries: ["kiosk", "admin", "reservation"]
                .into_iter()
                .map(RepositorySpec::conventional)
                .collect(),
        }
    }
}

impl RepositorySpec {
    /// `atdd-camping-<name>` with the application config and build-file overlays
    pub fn conventional(name: &str) -> Self {
        Self {
            name: name.to_string(),
            url: None,
            branch: None,
            directory: PathBuf::from(format!("atdd-camping-{}", name)),
            overlays: vec![
                Overlay {
                    source: PathBuf::from(format!("infra/configs/{}-application.yml", name)),
                    destination: PathBuf::from("src/main/resources/application.yml"),
                },
                Overlay {
                    source: PathBuf::from(format!("infra/configs/{}-build.gradle", name)),
                    destination: PathBuf::from("build.gradle"),
                },
            ],
        }
    }

    pub fn clone_url(&self, base_url: &str) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "{}/{}.git",
                base_url.trim_end_matches('/'),
                self.directory.display()
            ),
        }
    }

    pub fn branch<'a>(&'a self, default: &'a str) -> &'a str {
        self.branch.as_deref().unwrap_or(default)
    }
}

fn default_services() -> Vec<ServiceEndpoint> {
    [
        ("kiosk", "http://localhost:18081"),
        ("admin", "http://localhost:18082"),
        ("reservation", "http://localhost:18083"),
    ]
    .into_iter()
    .map(|(name, url)| ServiceEndpoint {
        name: name.to_string(),
        base_url: url.to_string(),
        health_path: default_health_path(),
    })
    .collect()
}

impl Settings {
    /// Layered load: defaults, then the config file, then `CAMPCTL__*`
    /// variables, then the per-service `<NAME>_BASE_URL` variables.
    ///
    /// An explicit `path` must exist; the default `campctl.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_in(path, None)
    }

    /// Same as [`Settings::load`], but the default `campctl.toml` is looked up
    /// under `root` instead of the working directory, and `root` replaces any
    /// `root` key from the file or environment.
    pub fn load_in(path: Option<&Path>, root: Option<&Path>) -> Result<Self> {
        let file = match (path, root) {
            (Some(p), _) => File::from(p).required(true),
            (None, Some(r)) => File::from(r.join(DEFAULT_CONFIG_FILE)).required(false),
            (None, None) => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        if let Some(r) = root {
            settings.root = r.to_path_buf();
        }
        settings.apply_service_overrides(|key| std::env::var(key).ok());
        settings.validate()?;

        tracing::debug!(root = %settings.root.display(), "Settings loaded");

        Ok(settings)
    }

    /// `KIOSK_BASE_URL`, `ADMIN_BASE_URL`, ... as read by the acceptance suite
    pub fn apply_service_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for service in &mut self.services {
            let key = format!("{}_BASE_URL", service.name.to_uppercase());
            if let Some(url) = lookup(&key) {
                service.base_url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.compose.program.is_empty() {
            return Err(Error::InvalidSettings(
                "compose.program must name a program".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for stack in &self.compose.stacks {
            if !seen.insert(stack.name.as_str()) {
                return Err(Error::InvalidSettings(format!(
                    "compose stack defined twice: {}",
                    stack.name
                )));
            }
        }

        for required in [INFRA_STACK, APPS_STACK] {
            if self.stack(required).is_none() {
                return Err(Error::InvalidSettings(format!(
                    "compose.stacks must define the `{}` stack",
                    required
                )));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for repo in &self.repositories.entries {
            if !seen.insert(repo.name.as_str()) {
                return Err(Error::InvalidSettings(format!(
                    "repository defined twice: {}",
                    repo.name
                )));
            }
        }

        if self.readiness.strategy == ReadinessStrategy::ContainerHealth {
            if self.readiness.containers.is_empty() {
                return Err(Error::InvalidSettings(
                    "readiness.containers is required for the container-health strategy"
                        .to_string(),
                ));
            }
            if self.readiness.max_attempts == 0 {
                return Err(Error::InvalidSettings(
                    "readiness.max_attempts must be at least 1".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn stack(&self, name: &str) -> Option<&ComposeStack> {
        self.compose.stacks.iter().find(|s| s.name == name)
    }

    pub fn repository(&self, name: &str) -> Option<&RepositorySpec> {
        self.repositories.entries.iter().find(|r| r.name == name)
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.root.join(&self.repositories.directory)
    }
}
