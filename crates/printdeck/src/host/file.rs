//! Offline host: states from a JSON dump, commands only logged.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::Host;
use super::HostError;
use super::StateSource;
use crate::state::StateSnapshot;

/// Reads a snapshot from a file in the `/api/states` format (a JSON array of
/// `{entity_id, state, attributes}` objects). The file is re-read on every
/// call, so each call is a fresh tick.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<StateSnapshot, HostError> {
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| HostError::Io(self.path.clone(), e))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[async_trait]
impl StateSource for StateFile {
    async fn states(&self) -> Result<StateSnapshot, HostError> {
        self.load()
    }
}

/// Host that logs service calls instead of sending them.
#[derive(Debug, Clone)]
pub struct DryRun {
    base_url: String,
}

impl DryRun {
    /// URLs are resolved against `base_url` (trailing slashes dropped).
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Host for DryRun {
    fn call_service(&self, domain: &str, service: &str, payload: Value) {
        info!("Dry run, not calling {}.{} with {}", domain, service, payload);
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("states.json");
        std::fs::write(
            &path,
            r#"[{"entity_id": "sensor.k1_progress", "state": "45", "attributes": {}}]"#,
        )
        .unwrap();

        let source = StateFile::new(&path);
        let snapshot = source.states().await.unwrap();
        assert_eq!(snapshot.get("sensor.k1_progress").unwrap().state, "45");
    }

    #[test]
    fn test_state_file_errors() {
        let dir = tempfile::TempDir::new().unwrap();

        let missing = StateFile::new(dir.path().join("missing.json"));
        assert!(matches!(missing.load(), Err(HostError::Io(_, _))));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(StateFile::new(&path).load(), Err(HostError::Decode(_))));
    }

    #[test]
    fn test_dry_run_urls() {
        let host = DryRun::new("http://ha.local:8123/");
        assert_eq!(
            host.url("/api/camera_proxy/camera.k1"),
            "http://ha.local:8123/api/camera_proxy/camera.k1"
        );
    }
}
