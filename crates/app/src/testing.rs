//! In-memory test doubles for the transport and actuator ports.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for adapter crates' dev-dependencies.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use hap_domain::command::Action;
use hap_domain::device::Device;
use hap_domain::error::HapError;
use hap_domain::id::HardwareId;
use hap_domain::message::Qos;

use crate::ports::{
    Actuator, ConnectOptions, Connector, RawMessage, Transport, TransportEvent, TransportEvents,
};

#[derive(Debug, Default)]
struct State {
    options: Option<ConnectOptions>,
    published: Vec<RawMessage>,
    subscribed: Vec<String>,
    disconnected: bool,
    fail_publishes: bool,
}

/// Connector producing a [`MemoryTransport`] and [`MemoryEvents`].
pub struct MemoryConnector {
    state: Arc<Mutex<State>>,
    stall: Arc<watch::Sender<bool>>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Test-side handle: inject transport events and inspect traffic.
pub struct MemoryHandle {
    state: Arc<Mutex<State>>,
    stall: Arc<watch::Sender<bool>>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

/// Transport that records everything it is asked to do.
#[derive(Clone)]
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
    stall: Arc<watch::Sender<bool>>,
}

/// Event stream fed by a [`MemoryHandle`]. Ends when the handle is dropped.
pub struct MemoryEvents {
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryConnector {
    /// Create a connector and the handle controlling it.
    #[must_use]
    pub fn new() -> (Self, MemoryHandle) {
        let state = Arc::new(Mutex::new(State::default()));
        let stall = Arc::new(watch::Sender::new(false));
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                state: Arc::clone(&state),
                stall: Arc::clone(&stall),
                events: rx,
            },
            MemoryHandle {
                state,
                stall,
                events: tx,
            },
        )
    }
}

impl Connector for MemoryConnector {
    type Transport = MemoryTransport;
    type Events = MemoryEvents;

    fn connect(self, options: ConnectOptions) -> Result<(MemoryTransport, MemoryEvents), HapError> {
        lock(&self.state).options = Some(options);
        Ok((
            MemoryTransport {
                state: self.state,
                stall: self.stall,
            },
            MemoryEvents {
                events: self.events,
            },
        ))
    }
}

impl Transport for MemoryTransport {
    async fn subscribe(&self, filters: Vec<String>, _qos: Qos) -> Result<(), HapError> {
        lock(&self.state).subscribed.extend(filters);
        Ok(())
    }

    async fn publish(&self, message: RawMessage) -> Result<(), HapError> {
        // The sender lives as long as the transport.
        let _ = self.stall.subscribe().wait_for(|stalled| !stalled).await;
        let mut state = lock(&self.state);
        if state.fail_publishes {
            return Err(HapError::Transport("publish refused".into()));
        }
        state.published.push(message);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), HapError> {
        lock(&self.state).disconnected = true;
        Ok(())
    }
}

impl TransportEvents for MemoryEvents {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }
}

impl MemoryHandle {
    /// Simulate a completed handshake.
    pub fn connected(&self, session_present: bool) {
        self.send(TransportEvent::Connected { session_present });
    }

    /// Simulate a dropped connection.
    pub fn connection_lost(&self, reason: &str) {
        self.send(TransportEvent::ConnectionLost {
            reason: reason.to_string(),
        });
    }

    /// Simulate an inbound message on a full transport topic.
    pub fn message(&self, topic: &str, payload: &[u8], retain: bool) {
        self.send(TransportEvent::Message(RawMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos: Qos::AtMostOnce,
            retain,
        }));
    }

    /// Make every subsequent publish fail (or succeed again).
    pub fn fail_publishes(&self, fail: bool) {
        lock(&self.state).fail_publishes = fail;
    }

    /// Hold every publish until called again with `false`.
    pub fn stall_publishes(&self, stall: bool) {
        self.stall.send_replace(stall);
    }

    /// Options passed to the connector.
    #[must_use]
    pub fn connect_options(&self) -> Option<ConnectOptions> {
        lock(&self.state).options.clone()
    }

    /// Every publish so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<RawMessage> {
        lock(&self.state).published.clone()
    }

    /// Publishes on one full transport topic.
    #[must_use]
    pub fn published_on(&self, topic: &str) -> Vec<RawMessage> {
        lock(&self.state)
            .published
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Forget everything published so far.
    pub fn clear_published(&self) {
        lock(&self.state).published.clear();
    }

    /// Every subscribed filter so far, in order.
    #[must_use]
    pub fn subscribed(&self) -> Vec<String> {
        lock(&self.state).subscribed.clone()
    }

    /// Whether the transport was asked to disconnect.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        lock(&self.state).disconnected
    }

    fn send(&self, event: TransportEvent) {
        // The receiver only goes away with the session under test.
        let _ = self.events.send(event);
    }
}

/// How a [`RecordingActuator`] answers dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActuatorMode {
    #[default]
    Succeed,
    Fail,
    /// Never complete within the given duration.
    Stall(Duration),
}

/// Actuator that records dispatched actions.
#[derive(Clone, Default)]
pub struct RecordingActuator {
    dispatched: Arc<Mutex<Vec<(HardwareId, Action)>>>,
    flushed: Arc<Mutex<usize>>,
    mode: Arc<Mutex<ActuatorMode>>,
}

impl RecordingActuator {
    /// Change how subsequent dispatches behave.
    pub fn set_mode(&self, mode: ActuatorMode) {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    /// Every dispatched `(hardware id, action)` pair, in order.
    #[must_use]
    pub fn dispatched(&self) -> Vec<(HardwareId, Action)> {
        self.dispatched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times [`Actuator::flush`] was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self.flushed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Actuator for RecordingActuator {
    async fn dispatch(&self, device: &Device, action: Action) -> Result<(), HapError> {
        self.dispatched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((device.hardware_id.clone(), action));
        let mode = *self.mode.lock().unwrap_or_else(PoisonError::into_inner);
        match mode {
            ActuatorMode::Succeed => Ok(()),
            ActuatorMode::Fail => Err(HapError::Hardware("connection refused".into())),
            ActuatorMode::Stall(duration) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
        }
    }

    async fn flush(&self) -> Result<(), HapError> {
        *self.flushed.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}
