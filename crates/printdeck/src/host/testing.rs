use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::Host;
use super::HostError;
use super::StateSource;
use crate::state::StateSnapshot;

/// A service call captured by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub domain: String,
    pub service: String,
    pub payload: Value,
}

/// Host double that records service calls and resolves URLs against a fixed
/// base.
#[derive(Debug, Default)]
pub struct RecordingHost {
    base: String,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingHost {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Host for RecordingHost {
    fn call_service(&self, domain: &str, service: &str, payload: Value) {
        self.calls.lock().unwrap().push(RecordedCall {
            domain: domain.to_string(),
            service: service.to_string(),
            payload,
        });
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// State source serving the same snapshot every tick.
#[derive(Debug, Default)]
pub struct FixedStates(pub StateSnapshot);

#[async_trait]
impl StateSource for FixedStates {
    async fn states(&self) -> Result<StateSnapshot, HostError> {
        Ok(self.0.clone())
    }
}

/// State source whose host is always down.
#[derive(Debug, Default)]
pub struct Unreachable;

#[async_trait]
impl StateSource for Unreachable {
    async fn states(&self) -> Result<StateSnapshot, HostError> {
        Err(HostError::Status {
            status: 503,
            url: "http://ha.local:8123/api/states".to_string(),
        })
    }
}
