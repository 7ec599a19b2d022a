//! Sensor driver: Oregon-style temperature/humidity sensors and OWL-style
//! power meters.
//!
//! Readings are republished retained on `events/<category>/<name>` with every
//! value rendered as a string.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use hap_app::driver::Driver;
use hap_app::event_publisher::EventPublisher;
use hap_app::ports::Transport;
use hap_app::session::BusSession;
use hap_domain::error::HapError;
use hap_domain::event::HardwareEvent;
use hap_domain::message::{Message, SubscribeOptions};
use hap_domain::registry::DeviceRegistry;
use hap_domain::topic::Topic;

use crate::config::SensorConfig;

const TEMPERATURE_CATEGORY: &str = "temperature_sensor";
const POWER_CATEGORY: &str = "power_meter";

/// RF sensor driver.
pub struct SensorDriver {
    config: SensorConfig,
    events_topic: Topic,
    registry: DeviceRegistry,
    publishers: BTreeMap<String, EventPublisher>,
}

impl SensorDriver {
    #[must_use]
    pub fn new(config: SensorConfig) -> Self {
        let publishers = config
            .categories
            .iter()
            .map(|(kind, category)| (kind.clone(), EventPublisher::new(category)))
            .collect();
        Self {
            events_topic: Topic::new(&config.events_topic),
            config,
            registry: DeviceRegistry::default(),
            publishers,
        }
    }
}

impl<T: Transport> Driver<T> for SensorDriver {
    fn name(&self) -> &'static str {
        "sensors"
    }

    async fn init(&mut self, _session: &BusSession<T>) -> Result<(), HapError> {
        self.registry = self.config.registry()?;
        tracing::info!(sensors = self.registry.len(), "sensor driver initialised");
        Ok(())
    }

    async fn run(&mut self, session: &BusSession<T>) -> Result<(), HapError> {
        session
            .subscribe(&[self.events_topic.clone()], SubscribeOptions::default())
            .await?;
        Ok(())
    }

    async fn on_message(&mut self, session: &BusSession<T>, message: &Message) -> Result<(), HapError> {
        if message.topic != self.events_topic {
            return Ok(());
        }
        let event: HardwareEvent = message.json()?;
        let Some(kind) = event.kind.as_deref() else {
            tracing::debug!("ignoring receiver event without type");
            return Ok(());
        };
        let (Some(category), Some(publisher)) =
            (self.config.categories.get(kind), self.publishers.get(kind))
        else {
            tracing::trace!(kind, "ignoring receiver event");
            return Ok(());
        };

        let reading = shape(category, event);
        publisher.publish(session, &self.registry, &reading).await;
        Ok(())
    }
}

/// Reshape a decoded event into the reading published for `category`.
#[must_use]
pub fn shape(category: &str, event: HardwareEvent) -> HardwareEvent {
    let values = match category {
        TEMPERATURE_CATEGORY => {
            let mut values = Map::new();
            for (from, to) in [
                ("temperature", "temperature"),
                ("humidity", "humidity"),
                ("batteryLevel", "battery"),
                ("rssi", "signal"),
            ] {
                if let Some(value) = event.values.get(from).and_then(as_text) {
                    values.insert(to.to_string(), Value::String(value));
                }
            }
            values
        }
        POWER_CATEGORY => {
            let mut values = Map::new();
            if let Some(power) = event.values.get("power").and_then(as_text) {
                values.insert("currentWatts".to_string(), Value::String(power));
            }
            let first_of_cycle = event.values.get("count").and_then(Value::as_u64) == Some(0);
            if first_of_cycle
                && let Some(energy) = event.values.get("energy").and_then(as_text)
            {
                values.insert("totalWatts".to_string(), Value::String(energy));
            }
            values
        }
        _ => event.values.clone(),
    };
    HardwareEvent {
        command: None,
        values,
        ..event
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
