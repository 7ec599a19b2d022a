//! Relay driver.

use hap_app::driver::Driver;
use hap_app::ports::Transport;
use hap_app::reconciler::CommandReconciler;
use hap_app::session::BusSession;
use hap_domain::error::HapError;
use hap_domain::message::{Message, SubscribeOptions};
use hap_domain::topic::Topic;

use crate::actuator::RelayActuator;
use crate::config::RelayConfig;

/// LC-Technology relay driver.
pub struct RelayDriver {
    config: RelayConfig,
    set_filter: Topic,
    reconciler: Option<CommandReconciler<RelayActuator>>,
}

impl RelayDriver {
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self {
            set_filter: Topic::new(&config.set_topic),
            config,
            reconciler: None,
        }
    }
}

impl<T: Transport> Driver<T> for RelayDriver {
    fn name(&self) -> &'static str {
        "relay"
    }

    async fn init(&mut self, _session: &BusSession<T>) -> Result<(), HapError> {
        let registry = self.config.registry()?;
        tracing::info!(relays = registry.len(), "relay driver initialised");
        self.reconciler = Some(
            CommandReconciler::new(
                registry,
                RelayActuator::new(self.config.port),
                Topic::new(&self.config.state_topic),
            )
            .with_dispatch_timeout(self.config.dispatch_timeout()),
        );
        Ok(())
    }

    async fn run(&mut self, session: &BusSession<T>) -> Result<(), HapError> {
        session
            .subscribe(&[self.set_filter.clone()], SubscribeOptions::default())
            .await?;
        Ok(())
    }

    async fn on_message(&mut self, session: &BusSession<T>, message: &Message) -> Result<(), HapError> {
        if !message.topic.matches(&self.set_filter) {
            return Ok(());
        }
        if let Some(reconciler) = self.reconciler.as_mut() {
            reconciler.handle_set(session, message).await;
        }
        Ok(())
    }

    async fn shutdown(&mut self, _session: &BusSession<T>) -> Result<(), HapError> {
        match &self.reconciler {
            Some(reconciler) => reconciler.flush().await,
            None => Ok(()),
        }
    }
}
