//! RF driver configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use hap_domain::error::HapError;
use hap_domain::registry::{DeviceRegistry, DeviceSpec};

/// Topic the receiver publishes decoded frames on.
pub const DEFAULT_EVENTS_TOPIC: &str = "devices/rfxcom/events";

/// Configuration of the lighting driver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Decoded receiver events.
    pub events_topic: String,
    /// Set commands; `+` stands for the logical name.
    pub set_topic: String,
    /// Base of the revertive topics.
    pub state_topic: String,
    /// Where transmit requests are published for the transceiver.
    pub transmit_topic: String,
    /// Receiver event types handled as switch presses.
    pub kinds: Vec<String>,
    /// Upper bound on a single transmit request.
    pub dispatch_timeout_secs: u64,
    /// Switches, in configuration order.
    pub switches: Vec<DeviceSpec>,
}

impl LightingConfig {
    #[must_use]
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    /// Build the switch registry.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty or duplicate names and ids.
    pub fn registry(&self) -> Result<DeviceRegistry, HapError> {
        DeviceRegistry::from_specs(&self.switches)
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            events_topic: DEFAULT_EVENTS_TOPIC.to_string(),
            set_topic: "events/switch/+/set".to_string(),
            state_topic: "events/lighting".to_string(),
            transmit_topic: "events/rfxcom/lighting1/transmit".to_string(),
            kinds: vec!["lighting1".to_string(), "lighting2".to_string()],
            dispatch_timeout_secs: 5,
            switches: Vec::new(),
        }
    }
}

/// Configuration of the sensor driver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Decoded receiver events.
    pub events_topic: String,
    /// Receiver event type → published category.
    pub categories: BTreeMap<String, String>,
    /// Sensors, in configuration order.
    pub devices: Vec<DeviceSpec>,
}

impl SensorConfig {
    /// Build the sensor registry.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty or duplicate names and ids.
    pub fn registry(&self) -> Result<DeviceRegistry, HapError> {
        DeviceRegistry::from_specs(&self.devices)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        let categories = [
            ("th1", "temperature_sensor"),
            ("th2", "temperature_sensor"),
            ("elec3", "power_meter"),
        ]
        .into_iter()
        .map(|(kind, category)| (kind.to_string(), category.to_string()))
        .collect();
        Self {
            events_topic: DEFAULT_EVENTS_TOPIC.to_string(),
            categories,
            devices: Vec::new(),
        }
    }
}
