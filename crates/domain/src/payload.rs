//! Canonical payloads published on the bus.

use serde::{Deserialize, Serialize};

use crate::level::Level;

/// Literal payload used to clear a previously retained command.
pub const CLEAR_MARKER: &str = "null";

/// Whether an inbound payload is a clearing marker (empty or `null`).
#[must_use]
pub fn is_clear_marker(payload: &[u8]) -> bool {
    payload.is_empty() || payload == CLEAR_MARKER.as_bytes()
}

/// Confirmed device state. The bus session adds the `timestamp` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revertive {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
}

impl Revertive {
    #[must_use]
    pub fn new(status: impl Into<String>, level: Option<Level>) -> Self {
        Self {
            status: status.into(),
            level,
        }
    }
}

/// Driver liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Up,
    Down,
}

/// Retained payload on `system/status/<driverId>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: Liveness,
    pub timestamp: String,
}

impl StatusReport {
    #[must_use]
    pub fn new(status: Liveness, timestamp: impl Into<String>) -> Self {
        Self {
            status,
            timestamp: timestamp.into(),
        }
    }
}
