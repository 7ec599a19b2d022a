//! # hap-adapter-mqtt
//!
//! MQTT adapter: implements the transport ports of `hap-app` on top of an
//! MQTT broker.
//!
//! ## Responsibilities
//! - Connect to the broker with the session's client id and last will
//! - Poll the `rumqttc` event loop in a background task and forward
//!   handshakes, messages and connection losses to the session
//! - Let `rumqttc` reconnect after a loss, pausing between attempts
//!
//! ## Dependency rule
//! Depends on `hap-app` (ports) and `hap-domain` only.

pub mod config;
pub mod error;
pub mod transport;

pub use config::MqttConfig;
pub use error::MqttError;
pub use transport::{MqttConnector, MqttEvents, MqttTransport};
