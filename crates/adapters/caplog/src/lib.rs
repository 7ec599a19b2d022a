//! # hap-adapter-caplog
//!
//! Captain's log: subscribes to every topic under the house prefix and
//! writes each message to the log.

use hap_app::driver::Driver;
use hap_app::ports::Transport;
use hap_app::session::BusSession;
use hap_domain::error::HapError;
use hap_domain::message::{Message, SubscribeOptions};
use hap_domain::topic::Topic;

/// Logs every message crossing the bus.
#[derive(Debug, Default)]
pub struct CaplogDriver {
    seen: u64,
}

impl CaplogDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages logged so far.
    #[must_use]
    pub fn seen(&self) -> u64 {
        self.seen
    }
}

impl<T: Transport> Driver<T> for CaplogDriver {
    fn name(&self) -> &'static str {
        "caplog"
    }

    async fn init(&mut self, _session: &BusSession<T>) -> Result<(), HapError> {
        Ok(())
    }

    async fn run(&mut self, session: &BusSession<T>) -> Result<(), HapError> {
        session
            .subscribe(&[Topic::new("#")], SubscribeOptions::default())
            .await?;
        Ok(())
    }

    async fn on_message(&mut self, _session: &BusSession<T>, message: &Message) -> Result<(), HapError> {
        self.seen += 1;
        tracing::info!(
            topic = %message.topic,
            payload = %message.text(),
            retain = message.retain,
            "caplog"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hap_app::session::SessionConfig;
    use hap_app::testing::MemoryConnector;
    use hap_domain::message::Qos;

    #[tokio::test]
    async fn should_subscribe_to_everything_under_prefix() {
        let (connector, handle) = MemoryConnector::new();
        let (session, _events) =
            BusSession::connect(connector, SessionConfig::new("home-caplog", "home")).unwrap();
        let mut driver = CaplogDriver::new();
        driver.run(&session).await.unwrap();
        assert_eq!(handle.subscribed(), vec!["home/#".to_string()]);
    }

    #[tokio::test]
    async fn should_log_without_publishing() {
        let (connector, handle) = MemoryConnector::new();
        let (session, _events) =
            BusSession::connect(connector, SessionConfig::new("home-caplog", "home")).unwrap();
        let mut driver = CaplogDriver::new();
        let message = Message {
            topic: Topic::new("events/lighting/hall_light"),
            payload: br#"{"status":"on"}"#.to_vec(),
            retain: true,
            qos: Qos::AtMostOnce,
        };
        driver.on_message(&session, &message).await.unwrap();
        driver.on_message(&session, &message).await.unwrap();
        assert_eq!(driver.seen(), 2);
        assert!(handle.published().is_empty());
    }
}
