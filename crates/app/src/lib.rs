//! # hap-app
//!
//! Application layer: the session and reconciliation core every driver
//! builds on, plus the **port definitions** (traits) adapters implement.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `Connector` / `Transport` / `TransportEvents`: the publish/subscribe
//!     transport (MQTT in production)
//!   - `Actuator`: the hardware a reconciler dispatches actions to
//! - `BusSession`: topic-prefixed publish/subscribe/revertive, last-will
//!   status reporting, resubscription on reconnect
//! - `CommandReconciler`: inbound `set` command → hardware action →
//!   retained confirmation, plus remote/group fan-out
//! - `EventPublisher`: decoded hardware event → canonical retained reading
//! - `Driver`: lifecycle trait and the runtime loop that drives it
//!
//! ## Dependency rule
//! Depends on `hap-domain` only (plus `tokio` for channels, timers and
//! `select!`). Never imports adapter crates.

pub mod driver;
pub mod event_publisher;
pub mod ports;
pub mod reconciler;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
