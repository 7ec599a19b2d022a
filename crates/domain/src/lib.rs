//! # hap-domain
//!
//! Pure domain model for the hap home-automation message bus.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Topics** (prefix-free segment paths with wildcard matching)
//! - Define **Messages** (topic + payload + retain + QoS)
//! - Define **Devices** and the read-only **DeviceRegistry** built from config
//! - Define the **set-command vocabulary** and its translation into hardware
//!   actions and confirmed state
//! - Define the canonical **payloads** (revertives, liveness status) and
//!   decoded **hardware events**
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod device;
pub mod event;
pub mod level;
pub mod message;
pub mod payload;
pub mod registry;
pub mod topic;
