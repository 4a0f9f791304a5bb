use crate::error::{LocalExecutorError, Result};
use campctl_core::ServiceEndpoint;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Hits each service's health endpoint and expects `200 OK`.
pub struct SmokeChecker {
    client: Client,
    services: Vec<ServiceEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHealth {
    pub name: String,
    pub url: String,
    pub status: Option<StatusCode>,
    pub error: Option<String>,
}

impl ServiceHealth {
    pub fn is_healthy(&self) -> bool {
        self.status == Some(StatusCode::OK)
    }
}

impl SmokeChecker {
    pub fn new(services: Vec<ServiceEndpoint>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, services })
    }

    pub async fn probe(&self, service: &ServiceEndpoint) -> ServiceHealth {
        let url = format!(
            "{}/{}",
            service.base_url.trim_end_matches('/'),
            service.health_path.trim_start_matches('/')
        );

        match self.client.get(&url).send().await {
            Ok(response) => ServiceHealth {
                name: service.name.clone(),
                url,
                status: Some(response.status()),
                error: None,
            },
            Err(e) => ServiceHealth {
                name: service.name.clone(),
                url,
                status: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Every service is probed, even after the first failure
    pub async fn check_all(&self) -> Result<Vec<ServiceHealth>> {
        let mut results = Vec::with_capacity(self.services.len());
        for service in &self.services {
            let health = self.probe(service).await;
            if health.is_healthy() {
                info!("{} healthy at {}", health.name, health.url);
            } else {
                warn!(
                    "{} unhealthy at {}: {}",
                    health.name,
                    health.url,
                    describe(&health)
                );
            }
            results.push(health);
        }

        let unhealthy: Vec<String> = results
            .iter()
            .filter(|h| !h.is_healthy())
            .map(|h| format!("{} ({})", h.name, describe(h)))
            .collect();

        if unhealthy.is_empty() {
            Ok(results)
        } else {
            Err(LocalExecutorError::Unhealthy(unhealthy.join(", ")))
        }
    }
}

fn describe(health: &ServiceHealth) -> String {
    match (&health.status, &health.error) {
        (Some(status), _) => status.to_string(),
        (None, Some(error)) => error.clone(),
        (None, None) => "no response".to_string(),
    }
}
