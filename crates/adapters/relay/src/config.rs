//! Relay driver configuration.

use std::time::Duration;

use serde::Deserialize;

use hap_domain::error::HapError;
use hap_domain::registry::{DeviceRegistry, DeviceSpec};

/// TCP port LC-Technology boards listen on.
pub const DEFAULT_PORT: u16 = 234;

/// One relay board.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelaySpec {
    /// Logical name used in topics.
    pub name: String,
    /// Board address.
    pub host: String,
}

/// Configuration of the relay driver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub set_topic: String,
    pub state_topic: String,
    pub port: u16,
    pub dispatch_timeout_secs: u64,
    pub relays: Vec<RelaySpec>,
}

impl RelayConfig {
    #[must_use]
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    /// Build the relay registry. Boards are keyed by host and never dimmable.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty or duplicate names and hosts.
    pub fn registry(&self) -> Result<DeviceRegistry, HapError> {
        let specs: Vec<DeviceSpec> = self
            .relays
            .iter()
            .map(|relay| DeviceSpec {
                id: relay.host.clone(),
                name: relay.name.clone(),
                group: None,
                dimming: false,
            })
            .collect();
        DeviceRegistry::from_specs(&specs)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            set_topic: "devices/relay/+/set".to_string(),
            state_topic: "devices/relay".to_string(),
            port: DEFAULT_PORT,
            dispatch_timeout_secs: 5,
            relays: Vec::new(),
        }
    }
}
