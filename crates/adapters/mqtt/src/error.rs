//! MQTT adapter error types.

use hap_domain::error::HapError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The background event loop needs a tokio runtime.
    #[error("MQTT connector used outside of a tokio runtime")]
    NoRuntime,

    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),
}

impl MqttError {
    /// Convert into a [`HapError::Transport`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> HapError {
        HapError::Transport(Box::new(self))
    }
}

impl From<MqttError> for HapError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}

impl From<rumqttc::ClientError> for MqttError {
    fn from(err: rumqttc::ClientError) -> Self {
        Self::Client(err)
    }
}
