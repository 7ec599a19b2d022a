//! MQTT broker configuration.

use std::time::Duration;

use serde::Deserialize;

use hap_domain::message::Qos;

/// Connection settings for the MQTT broker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker hostname or IP address.
    pub broker_host: String,
    /// Broker port.
    pub broker_port: u16,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Pause between reconnection attempts, in seconds.
    pub reconnect_delay_secs: u64,
    /// Capacity of the request and event channels.
    pub channel_capacity: usize,
    pub username: Option<String>,
    pub password: Option<String>,
    /// QoS of revertives (`at_most_once`, `at_least_once`, `exactly_once`).
    pub revertive_qos: Qos,
}

impl MqttConfig {
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(u64::from(self.keep_alive_secs))
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Credentials, when both halves are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            keep_alive_secs: 30,
            reconnect_delay_secs: 5,
            channel_capacity: 64,
            username: None,
            password: None,
            revertive_qos: Qos::AtMostOnce,
        }
    }
}
