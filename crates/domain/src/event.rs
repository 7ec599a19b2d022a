//! Decoded hardware events handed over by an external protocol decoder.
//!
//! Decoders publish one JSON object per received frame, e.g.
//!
//! ```json
//! {"type": "lighting2", "id": "0x00F0A1", "unitcode": 1, "command": "Group On"}
//! {"type": "th1", "id": "0xA201", "temperature": 21.5, "humidity": 40, "batteryLevel": 9, "rssi": 6}
//! ```
//!
//! Every field is optional: malformed frames are rejected by the event
//! publisher, not by deserialization.

use serde::{Deserialize, Serialize};

use crate::id::HardwareId;

/// A decoded frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareEvent {
    /// Decoder-specific packet type (`lighting1`, `th1`, `elec3`, …).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Source identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Unit code for multi-unit transmitters.
    #[serde(default, rename = "unitcode", skip_serializing_if = "Option::is_none")]
    pub unit_code: Option<u32>,
    /// Command for switch-like events (`On`, `Off`, `Group On`, …).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Any other reading values.
    #[serde(flatten)]
    pub values: serde_json::Map<String, serde_json::Value>,
}

impl HardwareEvent {
    /// Hardware id the event resolves to: `id`, or `id-unitcode` when a
    /// unit code is present.
    #[must_use]
    pub fn hardware_id(&self) -> Option<HardwareId> {
        let id = self.id.as_deref().filter(|id| !id.is_empty())?;
        Some(match self.unit_code {
            Some(unit) => HardwareId::new(format!("{id}-{unit}")),
            None => HardwareId::new(id),
        })
    }

    /// Whether the event carries a command or at least one reading.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.command.as_deref().is_some_and(|c| !c.is_empty()) || !self.values.is_empty()
    }
}

/// A remote-control command, possibly addressed to a whole group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    /// Whether the command targets every device of the source's group.
    pub group: bool,
    /// The action with any `Group ` prefix removed (e.g. `On`).
    pub action: String,
}

impl RemoteCommand {
    /// Split a decoder command such as `Group Off` into its parts.
    #[must_use]
    pub fn parse(command: &str) -> Self {
        let command = command.trim();
        match command.split_once(char::is_whitespace) {
            Some((head, rest)) if head == "Group" && !rest.trim().is_empty() => Self {
                group: true,
                action: rest.trim().to_string(),
            },
            _ => Self {
                group: false,
                action: command.to_string(),
            },
        }
    }

    /// Whether the action switches the device off.
    #[must_use]
    pub fn is_off(&self) -> bool {
        self.action.eq_ignore_ascii_case("off")
    }

    /// Status string published for this action.
    #[must_use]
    pub fn status(&self) -> String {
        self.action.to_lowercase()
    }
}
