//! Messages crossing the bus, and the options that shape them.

use serde::{Deserialize, Serialize};

use crate::topic::Topic;

/// Delivery guarantee requested from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qos {
    #[default]
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl Qos {
    /// Numeric QoS level (0, 1 or 2).
    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }
}

/// An inbound message with its prefix already removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: Topic,
    pub payload: Vec<u8>,
    pub retain: bool,
    pub qos: Qos,
}

impl Message {
    /// Payload as (lossy) UTF-8 text.
    #[must_use]
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Decode the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the payload is not valid JSON for `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

/// Options applied to an outbound publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishOptions {
    pub qos: Qos,
    pub retain: bool,
}

impl PublishOptions {
    /// Retained publish at QoS 0.
    #[must_use]
    pub fn retained() -> Self {
        Self {
            qos: Qos::AtMostOnce,
            retain: true,
        }
    }

    #[must_use]
    pub fn with_qos(mut self, qos: Qos) -> Self {
        self.qos = qos;
        self
    }
}

/// Options applied to a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscribeOptions {
    pub qos: Qos,
}

/// A granted (or recorded) subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub filter: Topic,
    pub qos: Qos,
}

/// Outbound payload.
///
/// JSON values are encoded before sending; text and bytes are sent verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Empty,
}

impl Payload {
    /// Encode into the bytes handed to the transport.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if a JSON value fails to encode.
    pub fn into_bytes(self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::Text(text) => Ok(text.into_bytes()),
            Self::Json(value) => serde_json::to_vec(&value),
            Self::Bytes(bytes) => Ok(bytes),
            Self::Empty => Ok(Vec::new()),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}
