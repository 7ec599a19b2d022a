//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `hap.toml` in the working directory, or the file named by
//! `HAP_CONFIG`. Every field has a default so the file is optional.
//! Environment variables take precedence over file values.

use serde::Deserialize;

use hap_adapter_mqtt::MqttConfig;
use hap_adapter_relay::RelayConfig;
use hap_adapter_rf::{LightingConfig, SensorConfig};
use hap_adapter_salvo::SalvoConfig;

const DEFAULT_PATH: &str = "hap.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings shared by every driver.
    pub global: GlobalConfig,
    /// Broker connection.
    pub mqtt: MqttConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    pub lighting: LightingConfig,
    pub sensors: SensorConfig,
    pub relay: RelayConfig,
    pub salvo: SalvoConfig,
}

/// Settings shared by every driver.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Topic prefix, and prefix of every driver id.
    pub house_id: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `HAP_CONFIG` or `hap.toml` (if present), then
    /// apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("HAP_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HAP_HOUSE_ID") {
            self.global.house_id = val;
        }
        if let Ok(val) = std::env::var("HAP_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Ok(val) = std::env::var("HAP_MQTT_PORT")
            && let Ok(port) = val.parse()
        {
            self.mqtt.broker_port = port;
        }
        if let Ok(val) = std::env::var("HAP_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.global.house_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "house_id must not be empty".to_string(),
            ));
        }
        if self.mqtt.broker_port == 0 {
            return Err(ConfigError::Validation(
                "broker port must be non-zero".to_string(),
            ));
        }
        let registries = [
            ("lighting", self.lighting.registry().map(|_| ())),
            ("sensors", self.sensors.registry().map(|_| ())),
            ("relay", self.relay.registry().map(|_| ())),
        ];
        for (section, result) in registries {
            if let Err(err) = result {
                let detail = std::error::Error::source(&err)
                    .map_or_else(|| err.to_string(), ToString::to_string);
                return Err(ConfigError::Validation(format!("[{section}] {detail}")));
            }
        }
        Ok(())
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            house_id: "home".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use hap_domain::message::Qos;

    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.global.house_id, "home");
        assert_eq!(config.mqtt.broker_host, "localhost");
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.logging.filter, "info");
        assert!(config.lighting.switches.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.global.house_id, "home");
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = r#"
            [global]
            house_id = "cottage"

            [mqtt]
            broker_host = "10.0.0.2"
            broker_port = 1884
            revertive_qos = "exactly_once"

            [logging]
            filter = "debug"

            [[lighting.switches]]
            id = "0x00F0A1-1"
            name = "hall_light"
            group = "downstairs"
            dimming = true

            [[lighting.switches]]
            id = "0x00F0A1-2"
            name = "lounge_lamp"
            group = "downstairs"

            [[sensors.devices]]
            id = "0xA201"
            name = "lounge"

            [[relay.relays]]
            name = "garden_pump"
            host = "192.168.1.40"

            [[salvo.salvos]]
            topic = "events/scene/lounge/set"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.global.house_id, "cottage");
        assert_eq!(config.mqtt.broker_host, "10.0.0.2");
        assert_eq!(config.mqtt.broker_port, 1884);
        assert_eq!(config.mqtt.revertive_qos, Qos::ExactlyOnce);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.lighting.switches.len(), 2);
        assert_eq!(config.lighting.switches[1].name, "lounge_lamp");
        assert_eq!(config.sensors.devices.len(), 1);
        assert_eq!(config.relay.relays[0].host, "192.168.1.40");
        assert_eq!(config.salvo.salvos.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.mqtt.broker_port, 1883);
    }

    #[test]
    fn should_reject_empty_house_id() {
        let mut config = Config::default();
        config.global.house_id = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.mqtt.broker_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_duplicate_device_names() {
        let toml = r#"
            [[relay.relays]]
            name = "garden_pump"
            host = "192.168.1.40"

            [[relay.relays]]
            name = "garden_pump"
            host = "192.168.1.41"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[relay]"));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
