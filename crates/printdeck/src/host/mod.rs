//! Boundary to the home-automation host.
//!
//! The engine never talks to the host directly. It reads a [`StateSnapshot`]
//! pulled from a [`StateSource`] and hands commands and URL building to a
//! [`Host`].

mod file;
#[cfg(feature = "host_ha")]
mod ha;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde_json::Value;

use crate::state::StateSnapshot;

pub use file::DryRun;
pub use file::StateFile;
#[cfg(feature = "host_ha")]
pub use ha::HomeAssistant;

/// Command and URL capabilities the host provides.
pub trait Host: Send + Sync {
    /// Invoke `domain.service` with `payload`. Fire and forget: no result is
    /// reported back and delivery is entirely the host's business.
    fn call_service(&self, domain: &str, service: &str, payload: Value);

    /// Turn a host-relative path (`/api/...`) into an absolute URL.
    fn url(&self, path: &str) -> String;
}

/// Something that can deliver the current state snapshot.
#[async_trait]
pub trait StateSource: Send + Sync {
    async fn states(&self) -> Result<StateSnapshot, HostError>;
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[cfg(feature = "host_ha")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Host returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Failed to read state file {0}: {1}")]
    Io(std::path::PathBuf, #[source] std::io::Error),

    #[error("Failed to decode states: {0}")]
    Decode(#[from] serde_json::Error),
}
