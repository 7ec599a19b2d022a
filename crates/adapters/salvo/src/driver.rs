//! Salvo driver.

use hap_app::driver::Driver;
use hap_app::ports::Transport;
use hap_app::session::BusSession;
use hap_domain::error::HapError;
use hap_domain::message::{Message, PublishOptions, SubscribeOptions};
use hap_domain::payload::Revertive;
use hap_domain::topic::Topic;

use crate::config::{SalvoConfig, Trigger};

/// Fires scenes when a watched topic receives a trigger value.
pub struct SalvoDriver {
    config: SalvoConfig,
    topics: Vec<Topic>,
}

impl SalvoDriver {
    #[must_use]
    pub fn new(config: SalvoConfig) -> Self {
        let topics = config.salvos.iter().map(|s| Topic::new(&s.topic)).collect();
        Self { config, topics }
    }

    async fn fire<T: Transport>(
        session: &BusSession<T>,
        topic: &Topic,
        trigger: &Trigger,
    ) -> Result<(), HapError> {
        tracing::info!(value = %trigger.value, %topic, "matched salvo");
        for action in &trigger.actions {
            tracing::debug!(topic = %action.topic, value = %action.value, "salvo action");
            session
                .publish(
                    &Topic::new(&action.topic),
                    action.value.as_str(),
                    PublishOptions::default(),
                )
                .await?;
        }
        session
            .revertive(
                &Topic::new(&trigger.revertive),
                &Revertive::new(trigger.value.as_str(), None),
            )
            .await
    }
}

impl<T: Transport> Driver<T> for SalvoDriver {
    fn name(&self) -> &'static str {
        "salvo"
    }

    async fn init(&mut self, _session: &BusSession<T>) -> Result<(), HapError> {
        tracing::info!(salvos = self.topics.len(), "salvo driver initialised");
        Ok(())
    }

    async fn run(&mut self, session: &BusSession<T>) -> Result<(), HapError> {
        if self.topics.is_empty() {
            tracing::warn!("no salvos configured");
            return Ok(());
        }
        session
            .subscribe(&self.topics, SubscribeOptions::default())
            .await?;
        Ok(())
    }

    async fn on_message(&mut self, session: &BusSession<T>, message: &Message) -> Result<(), HapError> {
        let payload = message.text();
        tracing::debug!(topic = %message.topic, %payload, "message received");
        for (salvo, topic) in self.config.salvos.iter().zip(&self.topics) {
            if *topic != message.topic {
                continue;
            }
            for trigger in salvo.matching(payload.trim()) {
                Self::fire(session, topic, trigger).await?;
            }
        }
        Ok(())
    }
}
