//! RF transmitter: an [`Actuator`] that asks the transceiver driver to send
//! a frame by publishing a transmit request on the bus.

use serde::Serialize;

use hap_app::ports::{Actuator, Transport};
use hap_app::session::BusSession;
use hap_domain::command::Action;
use hap_domain::device::Device;
use hap_domain::error::HapError;
use hap_domain::level::Level;
use hap_domain::message::PublishOptions;
use hap_domain::topic::Topic;

/// Body of a transmit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransmitRequest<'a> {
    pub device: &'a str,
    pub command: &'static str,
    pub value: u8,
}

impl<'a> TransmitRequest<'a> {
    #[must_use]
    pub fn new(device: &'a Device, action: Action) -> Self {
        let (command, value) = match action {
            Action::On => ("on", Level::FULL.value()),
            Action::Off => ("off", Level::OFF.value()),
            Action::Dim(level) => ("dim", level.value()),
        };
        Self {
            device: device.hardware_id.as_str(),
            command,
            value,
        }
    }
}

/// Publishes transmit requests for the transceiver driver.
///
/// Each dispatch returns once its request is handed to the session, so a
/// flush has nothing left to send.
pub struct RfTransmitter<T> {
    session: BusSession<T>,
    topic: Topic,
}

impl<T: Transport> RfTransmitter<T> {
    #[must_use]
    pub fn new(session: BusSession<T>, topic: Topic) -> Self {
        Self { session, topic }
    }
}

impl<T: Transport> Actuator for RfTransmitter<T> {
    async fn dispatch(&self, device: &Device, action: Action) -> Result<(), HapError> {
        let request = TransmitRequest::new(device, action);
        tracing::debug!(device = %device.logical_name, ?request, "transmitting");
        let payload = serde_json::to_value(&request)?;
        self.session
            .publish(&self.topic, payload, PublishOptions::default())
            .await
    }
}
