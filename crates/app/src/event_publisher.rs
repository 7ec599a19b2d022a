//! Event publisher: decoded hardware events → canonical retained readings.
//!
//! Events are published on `events/<category>/<logicalName>`. Events that
//! cannot be attributed to a configured device are logged and dropped.

use std::fmt;

use hap_domain::device::Device;
use hap_domain::event::HardwareEvent;
use hap_domain::id::HardwareId;
use hap_domain::registry::DeviceRegistry;
use hap_domain::topic::Topic;

use crate::ports::Transport;
use crate::session::BusSession;

/// Why an event was not published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The event carries no source identifier.
    MissingSource,
    /// The source identifier is not configured.
    UnknownDevice(HardwareId),
    /// The event has neither a command nor any reading.
    MissingContent(HardwareId),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSource => f.write_str("event has no source id"),
            Self::UnknownDevice(id) => write!(f, "unknown device {id}"),
            Self::MissingContent(id) => write!(f, "event from {id} has no command or value"),
        }
    }
}

/// Result of [`EventPublisher::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published(Topic),
    Rejected(Rejection),
    /// Validated, but the bus publish failed (already logged).
    Failed(Topic),
}

/// Publishes decoded events for one category.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    base: Topic,
}

impl EventPublisher {
    /// Publisher for `events/<category>/...`.
    #[must_use]
    pub fn new(category: &str) -> Self {
        Self {
            base: Topic::from_segments(["events", category]),
        }
    }

    /// Topic a device's readings are published on.
    #[must_use]
    pub fn topic_for(&self, device: &Device) -> Topic {
        self.base.join(device.logical_name.as_str())
    }

    /// Attribute `event` to a configured device.
    ///
    /// Rejections are logged at error level.
    ///
    /// # Errors
    ///
    /// Returns the first [`Rejection`] that applies: no source id, then no
    /// command or reading, then a source that is not configured.
    pub fn resolve<'r>(
        registry: &'r DeviceRegistry,
        event: &HardwareEvent,
    ) -> Result<&'r Device, Rejection> {
        let Some(id) = event.hardware_id() else {
            tracing::error!(event = ?event, "undefined event source id");
            return Err(Rejection::MissingSource);
        };
        if !event.has_content() {
            tracing::error!(%id, "corrupt event without command or value");
            return Err(Rejection::MissingContent(id));
        }
        registry.by_hardware_id(id.as_str()).ok_or_else(|| {
            tracing::error!(%id, "ignoring event for unknown device");
            Rejection::UnknownDevice(id)
        })
    }

    /// Validate and publish `event` as a retained, timestamped reading.
    ///
    /// Command events publish `{status}` (lower-cased command); reading
    /// events publish their values as-is.
    pub async fn publish<T: Transport>(
        &self,
        session: &BusSession<T>,
        registry: &DeviceRegistry,
        event: &HardwareEvent,
    ) -> PublishOutcome {
        let device = match Self::resolve(registry, event) {
            Ok(device) => device,
            Err(rejection) => return PublishOutcome::Rejected(rejection),
        };

        let mut body = serde_json::Map::new();
        match event.command.as_deref().filter(|c| !c.is_empty()) {
            Some(command) => {
                body.insert("status".to_string(), command.to_lowercase().into());
            }
            None => body.clone_from(&event.values),
        }

        let topic = self.topic_for(device);
        match session.revertive(&topic, &body).await {
            Ok(()) => {
                tracing::info!(device = %device.logical_name, %topic, "event published");
                PublishOutcome::Published(topic)
            }
            Err(err) => {
                tracing::error!(%err, device = %device.logical_name, "failed to publish event");
                PublishOutcome::Failed(topic)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;
    use crate::testing::{MemoryConnector, MemoryHandle, MemoryTransport};
    use hap_domain::registry::DeviceSpec;

    fn registry() -> DeviceRegistry {
        DeviceRegistry::from_specs(&[
            DeviceSpec {
                id: "0xA201".to_string(),
                name: "lounge".to_string(),
                group: None,
                dimming: false,
            },
            DeviceSpec {
                id: "0x00F0A1-1".to_string(),
                name: "porch_light".to_string(),
                group: None,
                dimming: false,
            },
        ])
        .unwrap()
    }

    fn session() -> (BusSession<MemoryTransport>, MemoryHandle) {
        let (connector, handle) = MemoryConnector::new();
        let (session, _events) =
            BusSession::connect(connector, SessionConfig::new("home-sensors", "home")).unwrap();
        (session, handle)
    }

    fn event(value: serde_json::Value) -> HardwareEvent {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn should_publish_reading_retained_under_category() {
        let (session, handle) = session();
        let publisher = EventPublisher::new("temperature_sensor");
        let outcome = publisher
            .publish(
                &session,
                &registry(),
                &event(serde_json::json!({"id": "0xA201", "temperature": "21.5"})),
            )
            .await;

        assert_eq!(
            outcome,
            PublishOutcome::Published(Topic::new("events/temperature_sensor/lounge"))
        );
        let published = handle.published_on("home/events/temperature_sensor/lounge");
        assert!(published[0].retain);
        let value: serde_json::Value = serde_json::from_slice(&published[0].payload).unwrap();
        assert_eq!(value["temperature"], "21.5");
        assert!(value["timestamp"].is_string());
    }

    #[tokio::test]
    async fn should_publish_command_as_lowercase_status() {
        let (session, handle) = session();
        let publisher = EventPublisher::new("lighting");
        publisher
            .publish(
                &session,
                &registry(),
                &event(serde_json::json!({"id": "0x00F0A1", "unitcode": 1, "command": "Off"})),
            )
            .await;

        let published = handle.published_on("home/events/lighting/porch_light");
        let value: serde_json::Value = serde_json::from_slice(&published[0].payload).unwrap();
        assert_eq!(value["status"], "off");
    }

    #[tokio::test]
    async fn should_reject_event_without_source() {
        let (session, handle) = session();
        let outcome = EventPublisher::new("lighting")
            .publish(&session, &registry(), &event(serde_json::json!({"command": "On"})))
            .await;
        assert_eq!(outcome, PublishOutcome::Rejected(Rejection::MissingSource));
        assert!(handle.published().is_empty());
    }

    #[tokio::test]
    async fn should_reject_unknown_device() {
        let (session, handle) = session();
        let outcome = EventPublisher::new("lighting")
            .publish(
                &session,
                &registry(),
                &event(serde_json::json!({"id": "0xFFFF", "command": "On"})),
            )
            .await;
        assert_eq!(
            outcome,
            PublishOutcome::Rejected(Rejection::UnknownDevice(HardwareId::new("0xFFFF")))
        );
        assert!(handle.published().is_empty());
    }

    #[tokio::test]
    async fn should_reject_event_without_command_or_value() {
        let (session, handle) = session();
        let outcome = EventPublisher::new("temperature_sensor")
            .publish(&session, &registry(), &event(serde_json::json!({"id": "0xA201"})))
            .await;
        assert!(matches!(
            outcome,
            PublishOutcome::Rejected(Rejection::MissingContent(_))
        ));
        assert!(handle.published().is_empty());
    }

    #[tokio::test]
    async fn should_report_failed_publish() {
        let (session, handle) = session();
        handle.fail_publishes(true);
        let outcome = EventPublisher::new("temperature_sensor")
            .publish(
                &session,
                &registry(),
                &event(serde_json::json!({"id": "0xA201", "temperature": "20"})),
            )
            .await;
        assert!(matches!(outcome, PublishOutcome::Failed(_)));
    }
}
