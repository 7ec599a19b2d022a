//! # hap-adapter-relay
//!
//! Relay adapter: drives LC-Technology ESP8266 relay boards. Each command
//! opens a TCP connection to the board, writes a 4-byte frame and closes it.
//!
//! Set commands arrive on `devices/relay/<name>/set`; confirmations are
//! published on `devices/relay/<name>`.

pub mod actuator;
pub mod config;
pub mod driver;
pub mod error;

pub use actuator::RelayActuator;
pub use config::{RelayConfig, RelaySpec};
pub use driver::RelayDriver;
pub use error::RelayError;
