//! Lighting driver: RF switches and dimmers.
//!
//! Set commands on `events/switch/<name>/set` are reconciled into transmit
//! requests and revertives on `events/lighting/<name>`. Presses on a remote
//! control arrive as decoded receiver events and are confirmed through the
//! same revertive topics, fanning out to the whole group for `Group …`
//! commands.

use hap_app::driver::Driver;
use hap_app::ports::Transport;
use hap_app::reconciler::CommandReconciler;
use hap_app::session::BusSession;
use hap_domain::error::HapError;
use hap_domain::event::HardwareEvent;
use hap_domain::message::{Message, SubscribeOptions};
use hap_domain::topic::Topic;

use crate::config::LightingConfig;
use crate::transmitter::RfTransmitter;

/// RF lighting driver.
pub struct LightingDriver<T> {
    config: LightingConfig,
    events_topic: Topic,
    set_filter: Topic,
    reconciler: Option<CommandReconciler<RfTransmitter<T>>>,
}

impl<T: Transport> LightingDriver<T> {
    #[must_use]
    pub fn new(config: LightingConfig) -> Self {
        Self {
            events_topic: Topic::new(&config.events_topic),
            set_filter: Topic::new(&config.set_topic),
            config,
            reconciler: None,
        }
    }

    /// The reconciler, once [`init`](Driver::init) has run.
    #[must_use]
    pub fn reconciler(&self) -> Option<&CommandReconciler<RfTransmitter<T>>> {
        self.reconciler.as_ref()
    }

    async fn on_receiver_event(
        &self,
        session: &BusSession<T>,
        message: &Message,
    ) -> Result<(), HapError> {
        let event: HardwareEvent = message.json()?;
        let kind = event.kind.as_deref().unwrap_or_default();
        if !self.config.kinds.iter().any(|k| k == kind) {
            tracing::trace!(kind, "ignoring receiver event");
            return Ok(());
        }
        if let Some(reconciler) = &self.reconciler {
            reconciler.handle_remote(session, &event).await;
        }
        Ok(())
    }
}

impl<T: Transport> Driver<T> for LightingDriver<T> {
    fn name(&self) -> &'static str {
        "lighting"
    }

    async fn init(&mut self, session: &BusSession<T>) -> Result<(), HapError> {
        let registry = self.config.registry()?;
        tracing::info!(switches = registry.len(), "lighting driver initialised");
        let transmitter =
            RfTransmitter::new(session.clone(), Topic::new(&self.config.transmit_topic));
        self.reconciler = Some(
            CommandReconciler::new(registry, transmitter, Topic::new(&self.config.state_topic))
                .with_dispatch_timeout(self.config.dispatch_timeout()),
        );
        Ok(())
    }

    async fn run(&mut self, session: &BusSession<T>) -> Result<(), HapError> {
        session
            .subscribe(
                &[self.events_topic.clone(), self.set_filter.clone()],
                SubscribeOptions::default(),
            )
            .await?;
        Ok(())
    }

    async fn on_message(&mut self, session: &BusSession<T>, message: &Message) -> Result<(), HapError> {
        if message.topic == self.events_topic {
            return self.on_receiver_event(session, message).await;
        }
        if message.topic.matches(&self.set_filter) {
            if let Some(reconciler) = self.reconciler.as_mut() {
                reconciler.handle_set(session, message).await;
            }
            return Ok(());
        }
        tracing::debug!(topic = %message.topic, "ignoring message on unexpected topic");
        Ok(())
    }

    async fn shutdown(&mut self, _session: &BusSession<T>) -> Result<(), HapError> {
        match &self.reconciler {
            Some(reconciler) => reconciler.flush().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hap_app::session::SessionConfig;
    use hap_app::testing::{MemoryConnector, MemoryHandle, MemoryTransport};
    use hap_domain::level::Level;
    use hap_domain::message::Qos;
    use hap_domain::registry::DeviceSpec;

    fn config() -> LightingConfig {
        LightingConfig {
            switches: vec![
                DeviceSpec {
                    id: "0x00F0A1-1".to_string(),
                    name: "hall_light".to_string(),
                    group: Some("downstairs".to_string()),
                    dimming: true,
                },
                DeviceSpec {
                    id: "0x00F0A1-2".to_string(),
                    name: "lounge_lamp".to_string(),
                    group: Some("downstairs".to_string()),
                    dimming: false,
                },
            ],
            ..LightingConfig::default()
        }
    }

    async fn started() -> (LightingDriver<MemoryTransport>, BusSession<MemoryTransport>, MemoryHandle) {
        let (connector, handle) = MemoryConnector::new();
        let (session, _events) =
            BusSession::connect(connector, SessionConfig::new("home-lighting", "home")).unwrap();
        let mut driver = LightingDriver::new(config());
        driver.init(&session).await.unwrap();
        driver.run(&session).await.unwrap();
        (driver, session, handle)
    }

    fn message(topic: &str, payload: &str) -> Message {
        Message {
            topic: Topic::new(topic),
            payload: payload.as_bytes().to_vec(),
            retain: false,
            qos: Qos::AtMostOnce,
        }
    }

    fn json(handle: &MemoryHandle, topic: &str) -> serde_json::Value {
        let published = handle.published_on(topic);
        serde_json::from_slice(&published.last().unwrap().payload).unwrap()
    }

    #[tokio::test]
    async fn should_subscribe_to_receiver_events_and_set_commands() {
        let (_driver, _session, handle) = started().await;
        assert_eq!(
            handle.subscribed(),
            vec![
                "home/devices/rfxcom/events".to_string(),
                "home/events/switch/+/set".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn should_shut_down_without_further_traffic() {
        let (mut driver, session, handle) = started().await;
        driver
            .on_message(&session, &message("events/switch/hall_light/set", "off"))
            .await
            .unwrap();
        let before = handle.published().len();

        driver.shutdown(&session).await.unwrap();
        assert_eq!(handle.published().len(), before);
    }

    #[tokio::test]
    async fn should_transmit_then_confirm_set_command() {
        let (mut driver, session, handle) = started().await;
        driver
            .on_message(&session, &message("events/switch/hall_light/set", "on"))
            .await
            .unwrap();

        let published = handle.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].topic, "home/events/rfxcom/lighting1/transmit");
        assert_eq!(published[1].topic, "home/events/lighting/hall_light");

        let transmit = json(&handle, "home/events/rfxcom/lighting1/transmit");
        assert_eq!(transmit["command"], "dim");
        assert_eq!(transmit["value"], 15);
        let revertive = json(&handle, "home/events/lighting/hall_light");
        assert_eq!(revertive["status"], "on");
        assert_eq!(revertive["level"], 15);
    }

    #[tokio::test]
    async fn should_fan_out_group_press_from_remote() {
        let (mut driver, session, handle) = started().await;
        driver
            .on_message(&session, &message("events/switch/hall_light/set", "5"))
            .await
            .unwrap();
        handle.clear_published();

        let event = r#"{"type":"lighting2","id":"0x00F0A1","unitcode":2,"command":"Group On"}"#;
        driver
            .on_message(&session, &message("devices/rfxcom/events", event))
            .await
            .unwrap();

        assert_eq!(handle.published().len(), 2);
        assert_eq!(json(&handle, "home/events/lighting/hall_light")["level"], 5);
        assert_eq!(json(&handle, "home/events/lighting/lounge_lamp")["level"], 0);
        let hall = driver
            .reconciler()
            .unwrap()
            .registry()
            .device_by_name("hall_light")
            .unwrap();
        assert_eq!(hall.last_level(), Level::new(5).unwrap());
    }

    #[tokio::test]
    async fn should_ignore_other_receiver_event_kinds() {
        let (mut driver, session, handle) = started().await;
        let event = r#"{"type":"th1","id":"0x00F0A1","unitcode":1,"temperature":20}"#;
        driver
            .on_message(&session, &message("devices/rfxcom/events", event))
            .await
            .unwrap();
        assert!(handle.published().is_empty());
    }

    #[tokio::test]
    async fn should_fail_on_malformed_receiver_event() {
        let (mut driver, session, handle) = started().await;
        let result = driver
            .on_message(&session, &message("devices/rfxcom/events", "{not json"))
            .await;
        assert!(matches!(result, Err(HapError::Payload(_))));
        assert!(handle.published().is_empty());
    }

    #[tokio::test]
    async fn should_reject_invalid_switch_configuration_at_init() {
        let (connector, _handle) = MemoryConnector::new();
        let (session, _events) =
            BusSession::connect(connector, SessionConfig::new("home-lighting", "home")).unwrap();
        let mut config = config();
        config.switches[1].name = "hall_light".to_string();
        let mut driver = LightingDriver::new(config);
        assert!(driver.init(&session).await.is_err());
    }
}
