//! # hap-adapter-rf
//!
//! RF adapter: bridges 433 MHz devices into the bus. Radio frames are
//! decoded by an external receiver driver which publishes them as JSON
//! [`HardwareEvent`](hap_domain::event::HardwareEvent)s on a bus topic.
//!
//! ## Drivers
//! - [`LightingDriver`]: switches and dimmers: `set` commands are turned
//!   into transmit requests, remote-control presses into revertives
//! - [`SensorDriver`]: temperature/humidity sensors and power meters
//!
//! ## Dependency rule
//! Depends on `hap-app` and `hap-domain` only.

pub mod config;
pub mod lighting;
pub mod sensors;
pub mod transmitter;

pub use config::{LightingConfig, SensorConfig};
pub use lighting::LightingDriver;
pub use sensors::SensorDriver;
pub use transmitter::RfTransmitter;
