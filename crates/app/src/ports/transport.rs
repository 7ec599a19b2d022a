//! Transport port: the raw publish/subscribe connection to the bus.
//!
//! Topics at this boundary are full transport topics (prefix included);
//! prefixing and stripping is the bus session's job.

use std::future::Future;

use hap_domain::error::HapError;
use hap_domain::message::Qos;

/// A message as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: Qos,
    pub retain: bool,
}

/// What the transport needs to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Unique client identifier.
    pub client_id: String,
    /// Message the broker publishes if the client disappears.
    pub last_will: RawMessage,
}

/// Something that happened on the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed (first connect or reconnect).
    Connected { session_present: bool },
    /// A message arrived on a subscribed topic.
    Message(RawMessage),
    /// The connection dropped; the transport will retry on its own.
    ConnectionLost { reason: String },
}

/// Outbound half of a transport connection.
///
/// Cheap to clone; clones share the same connection.
pub trait Transport: Clone + Send + Sync + 'static {
    /// Subscribe to transport topic filters.
    fn subscribe(
        &self,
        filters: Vec<String>,
        qos: Qos,
    ) -> impl Future<Output = Result<(), HapError>> + Send;

    /// Publish one message.
    fn publish(&self, message: RawMessage) -> impl Future<Output = Result<(), HapError>> + Send;

    /// Close the connection cleanly (no last will).
    fn disconnect(&self) -> impl Future<Output = Result<(), HapError>> + Send;
}

/// Inbound half of a transport connection.
pub trait TransportEvents: Send {
    /// Wait for the next event. `None` once the connection is closed for good.
    fn next_event(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send;
}

/// Opens transport connections.
pub trait Connector {
    type Transport: Transport;
    type Events: TransportEvents;

    /// Start connecting. The handshake completes asynchronously and is
    /// reported as [`TransportEvent::Connected`].
    ///
    /// # Errors
    ///
    /// Returns [`HapError::Transport`] if the connection cannot even be set up
    /// (e.g. invalid options).
    fn connect(self, options: ConnectOptions) -> Result<(Self::Transport, Self::Events), HapError>;
}
