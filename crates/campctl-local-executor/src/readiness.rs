use crate::error::{LocalExecutorError, Result};
use async_trait::async_trait;
use bollard::container::InspectContainerOptions;
use bollard::models::{ContainerState, HealthStatusEnum};
use bollard::Docker;
use campctl_core::{ReadinessSettings, ReadinessStrategy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn is_ready(&self) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub initial: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    /// Delay after the failed attempt number `attempt` (1-based): doubles each
    /// time, capped at `max`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

impl From<&ReadinessSettings> for BackoffPolicy {
    fn from(settings: &ReadinessSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial: Duration::from_millis(settings.initial_backoff_ms),
            max: Duration::from_millis(settings.max_backoff_ms),
        }
    }
}

/// What has to happen before a dependent stack may start.
pub enum ReadinessGate {
    Immediate,
    /// Unconditional pause; does not look at the dependency at all
    FixedDelay(Duration),
    Poll {
        probe: Arc<dyn ReadinessProbe>,
        policy: BackoffPolicy,
    },
}

impl ReadinessGate {
    pub fn from_settings(settings: &ReadinessSettings) -> Result<Self> {
        let gate = match settings.strategy {
            ReadinessStrategy::None => ReadinessGate::Immediate,
            ReadinessStrategy::FixedDelay => {
                ReadinessGate::FixedDelay(Duration::from_secs(settings.delay_secs))
            }
            ReadinessStrategy::ContainerHealth => {
                let probe = ContainerHealthProbe::connect(settings.containers.clone())?;
                ReadinessGate::Poll {
                    probe: Arc::new(probe),
                    policy: BackoffPolicy::from(settings),
                }
            }
        };
        Ok(gate)
    }

    pub async fn wait(&self, stack: &str) -> Result<()> {
        match self {
            ReadinessGate::Immediate => Ok(()),
            ReadinessGate::FixedDelay(delay) => {
                info!("Waiting {:?} for stack {}", delay, stack);
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            ReadinessGate::Poll { probe, policy } => {
                for attempt in 1..=policy.max_attempts {
                    match probe.is_ready().await {
                        Ok(true) => {
                            info!("Stack {} ready after {} attempt(s)", stack, attempt);
                            return Ok(());
                        }
                        Ok(false) => debug!("Stack {} not ready (attempt {})", stack, attempt),
                        Err(e) => warn!("Readiness probe for {} failed: {}", stack, e),
                    }

                    if attempt < policy.max_attempts {
                        tokio::time::sleep(policy.delay_after(attempt)).await;
                    }
                }

                Err(LocalExecutorError::NotReady {
                    stack: stack.to_string(),
                    attempts: policy.max_attempts,
                })
            }
        }
    }
}

/// Asks the Docker Engine whether every named container is up.
pub struct ContainerHealthProbe {
    docker: Docker,
    containers: Vec<String>,
}

impl ContainerHealthProbe {
    pub fn connect(containers: Vec<String>) -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker, containers })
    }
}

#[async_trait]
impl ReadinessProbe for ContainerHealthProbe {
    async fn is_ready(&self) -> Result<bool> {
        for name in &self.containers {
            let inspect = self
                .docker
                .inspect_container(name, None::<InspectContainerOptions>)
                .await?;

            let ready = inspect.state.as_ref().map(container_ready).unwrap_or(false);
            if !ready {
                debug!("Container {} not ready yet", name);
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Healthy when the image defines a healthcheck, running otherwise
pub fn container_ready(state: &ContainerState) -> bool {
    let health = state.health.as_ref().and_then(|h| h.status.as_ref());
    match health {
        Some(&HealthStatusEnum::HEALTHY) => true,
        Some(&HealthStatusEnum::STARTING) | Some(&HealthStatusEnum::UNHEALTHY) => false,
        _ => state.running.unwrap_or(false),
    }
}
