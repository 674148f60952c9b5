//! Home Assistant REST host.
//!
//! Pulls `/api/states` for each tick and posts service calls to
//! `/api/services/<domain>/<service>` in the background.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use super::Host;
use super::HostError;
use super::StateSource;
use crate::state::EntityState;
use crate::state::StateSnapshot;

/// Connection to a Home Assistant instance over its REST API.
#[derive(Debug, Clone)]
pub struct HomeAssistant {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HomeAssistant {
    pub fn new(base_url: &str, token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl StateSource for HomeAssistant {
    async fn states(&self) -> Result<StateSnapshot, HostError> {
        let url = self.endpoint("/api/states");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HostError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let entities: Vec<EntityState> = response.json().await?;
        debug!("Fetched {} entities from {}", entities.len(), url);
        Ok(entities.into())
    }
}

impl Host for HomeAssistant {
    fn call_service(&self, domain: &str, service: &str, payload: Value) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, dropping call to {}.{}", domain, service);
            return;
        };

        let request = self
            .client
            .post(self.endpoint(&format!("/api/services/{domain}/{service}")))
            .bearer_auth(&self.token)
            .json(&payload);
        let name = format!("{domain}.{service}");

        runtime.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("Service call {} accepted", name);
                }
                Ok(response) => {
                    warn!("Service call {} rejected: {}", name, response.status());
                }
                Err(e) => warn!("Service call {} failed: {}", name, e),
            }
        });
    }

    fn url(&self, path: &str) -> String {
        self.endpoint(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_absolute() {
        let ha = HomeAssistant::new("http://homeassistant.local:8123/", "t".to_string());
        assert_eq!(
            ha.url("/api/camera_proxy_stream/camera.k1?token=abc"),
            "http://homeassistant.local:8123/api/camera_proxy_stream/camera.k1?token=abc"
        );
    }

    #[test]
    fn test_call_without_runtime_is_dropped() {
        let ha = HomeAssistant::new("http://127.0.0.1:9", "t".to_string());
        // Must not panic outside of a runtime.
        ha.call_service("switch", "turn_on", serde_json::json!({}));
    }
}
