//! Bus session: topic-prefixed publish/subscribe on top of a [`Transport`].
//!
//! The session owns the process-wide topic prefix: every outbound topic is
//! rendered as `<prefix>/<topic>` and every inbound topic has the prefix
//! stripped before it reaches a driver.
//!
//! Liveness is reported on `system/status/<driverId>`: a retained `down`
//! report is registered as the transport's last will, and a retained `up`
//! report is published on every successful handshake (reconnects included).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use hap_domain::error::{HapError, ValidationError};
use hap_domain::id::DriverId;
use hap_domain::message::{Message, Payload, PublishOptions, Qos, SubscribeOptions, Subscription};
use hap_domain::payload::{Liveness, StatusReport};
use hap_domain::time::iso_now;
use hap_domain::topic::Topic;

use crate::ports::{ConnectOptions, Connector, RawMessage, Transport, TransportEvent, TransportEvents};

/// Static session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Driver identifier; also the transport client id.
    pub driver_id: DriverId,
    /// Process-wide topic prefix (usually the house id).
    pub topic_prefix: String,
    /// QoS used for revertives.
    pub revertive_qos: Qos,
}

impl SessionConfig {
    #[must_use]
    pub fn new(driver_id: impl Into<DriverId>, topic_prefix: impl Into<String>) -> Self {
        Self {
            driver_id: driver_id.into(),
            topic_prefix: topic_prefix.into(),
            revertive_qos: Qos::AtMostOnce,
        }
    }

    /// Publish revertives with `qos` instead of at-most-once.
    #[must_use]
    pub fn with_revertive_qos(mut self, qos: Qos) -> Self {
        self.revertive_qos = qos;
        self
    }
}

/// What a driver observes on the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Handshake completed and `status=up` was published.
    Connected { session_present: bool },
    /// A message on a subscribed topic, prefix removed.
    Message(Message),
    /// The connection dropped; the transport is retrying.
    Disconnected,
}

/// Handle on a bus session. Cheap to clone.
pub struct BusSession<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    transport: T,
    config: SessionConfig,
    status_topic: Topic,
    connected: AtomicBool,
    handshakes: AtomicU64,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl<T> Clone for BusSession<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Liveness topic of a driver.
#[must_use]
pub fn status_topic(driver_id: &DriverId) -> Topic {
    Topic::from_segments(["system", "status", driver_id.as_str()])
}

impl<T: Transport> BusSession<T> {
    /// Open a session through `connector`, registering the `down` last will.
    ///
    /// The returned [`SessionEvents`] must be polled for the session to make
    /// progress; the first [`SessionEvent::Connected`] marks the point from
    /// which drivers may start.
    ///
    /// # Errors
    ///
    /// Returns [`HapError::Transport`] if the connector rejects the options,
    /// or [`HapError::Payload`] if the will cannot be encoded.
    pub fn connect<C>(
        connector: C,
        config: SessionConfig,
    ) -> Result<(Self, SessionEvents<T, C::Events>), HapError>
    where
        C: Connector<Transport = T>,
    {
        let status_topic = status_topic(&config.driver_id);
        let will = StatusReport::new(Liveness::Down, iso_now());
        let options = ConnectOptions {
            client_id: config.driver_id.to_string(),
            last_will: RawMessage {
                topic: status_topic.render(&config.topic_prefix),
                payload: serde_json::to_vec(&will)?,
                qos: Qos::AtMostOnce,
                retain: true,
            },
        };

        tracing::info!(
            driver_id = %config.driver_id,
            prefix = %config.topic_prefix,
            "connecting to bus"
        );
        let (transport, events) = connector.connect(options)?;

        let session = Self::from_parts(transport, config, status_topic);
        let events = SessionEvents {
            session: session.clone(),
            events,
            pending: None,
        };
        Ok((session, events))
    }

    fn from_parts(transport: T, config: SessionConfig, status_topic: Topic) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                config,
                status_topic,
                connected: AtomicBool::new(false),
                handshakes: AtomicU64::new(0),
                subscriptions: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Identifier of the driver owning this session.
    #[must_use]
    pub fn driver_id(&self) -> &DriverId {
        &self.inner.config.driver_id
    }

    /// Whether the last transport event was a successful handshake.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Liveness topic of this session (prefix-free).
    #[must_use]
    pub fn status_topic(&self) -> &Topic {
        &self.inner.status_topic
    }

    /// Subscriptions recorded so far, in the order they were made.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.lock_subscriptions().clone()
    }

    /// Subscribe to one or more topics or wildcard filters.
    ///
    /// Subscriptions are remembered and re-issued after a reconnect that did
    /// not restore the previous transport session. Failures are logged here;
    /// callers may ignore the result.
    ///
    /// # Errors
    ///
    /// Returns [`HapError::Transport`] if the transport rejects the request.
    #[tracing::instrument(skip(self, filters), fields(count = filters.len()))]
    pub async fn subscribe(
        &self,
        filters: &[Topic],
        options: SubscribeOptions,
    ) -> Result<Vec<Subscription>, HapError> {
        let granted: Vec<Subscription> = filters
            .iter()
            .map(|filter| Subscription {
                filter: filter.clone(),
                qos: options.qos,
            })
            .collect();

        {
            let mut recorded = self.lock_subscriptions();
            for sub in &granted {
                match recorded.iter_mut().find(|s| s.filter == sub.filter) {
                    Some(existing) => existing.qos = sub.qos,
                    None => recorded.push(sub.clone()),
                }
            }
        }

        let rendered = self.render_all(filters);
        tracing::debug!(topics = ?rendered, "subscribing");
        match self.inner.transport.subscribe(rendered, options.qos).await {
            Ok(()) => {
                tracing::debug!(granted = ?granted, "subscribed");
                Ok(granted)
            }
            Err(err) => {
                tracing::error!(%err, "subscription failed");
                Err(err)
            }
        }
    }

    /// Publish `payload` on `topic`.
    ///
    /// JSON values are encoded; text and bytes are sent verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`HapError::Payload`] if encoding fails or
    /// [`HapError::Transport`] if the transport rejects the publish.
    pub async fn publish(
        &self,
        topic: &Topic,
        payload: impl Into<Payload>,
        options: PublishOptions,
    ) -> Result<(), HapError> {
        let payload = payload.into().into_bytes()?;
        let rendered = topic.render(&self.inner.config.topic_prefix);
        tracing::debug!(
            topic = %rendered,
            payload = %String::from_utf8_lossy(&payload),
            retain = options.retain,
            "publishing message"
        );

        let message = RawMessage {
            topic: rendered,
            payload,
            qos: options.qos,
            retain: options.retain,
        };
        self.inner.transport.publish(message).await.inspect_err(|err| {
            tracing::error!(%err, %topic, "publish failed");
        })
    }

    /// Publish a retained, timestamped confirmation of device state.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RevertiveNotObject`] unless `payload`
    /// serializes to a JSON object, or any error from [`publish`](Self::publish).
    pub async fn revertive(&self, topic: &Topic, payload: &impl Serialize) -> Result<(), HapError> {
        let serde_json::Value::Object(mut object) = serde_json::to_value(payload)? else {
            return Err(ValidationError::RevertiveNotObject.into());
        };
        object.insert("timestamp".to_string(), iso_now().into());

        tracing::debug!(%topic, "publishing revertive");
        let options = PublishOptions::retained().with_qos(self.inner.config.revertive_qos);
        self.publish(topic, serde_json::Value::Object(object), options)
            .await
    }

    /// Remove the retained message on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`HapError::Transport`] if the transport rejects the publish.
    pub async fn clear(&self, topic: &Topic) -> Result<(), HapError> {
        self.publish(topic, Payload::Empty, PublishOptions::retained())
            .await
    }

    /// Disconnect. Terminal: the session is not usable afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`HapError::Transport`] if the disconnect request fails.
    pub async fn close(&self) -> Result<(), HapError> {
        tracing::warn!("disconnecting from bus");
        self.inner.connected.store(false, Ordering::Release);
        self.inner.transport.disconnect().await
    }

    fn on_connected(&self, session_present: bool) -> Handshake {
        let previous = self.inner.handshakes.fetch_add(1, Ordering::AcqRel);
        self.inner.connected.store(true, Ordering::Release);
        tracing::info!("connected to bus");
        if session_present {
            tracing::info!("restored existing session");
        }
        Handshake {
            session_present,
            restore: previous > 0 && !session_present,
        }
    }

    async fn complete_handshake(&self, handshake: Handshake) {
        let report = StatusReport::new(Liveness::Up, iso_now());
        let status = serde_json::to_value(report).map(Payload::Json);
        match status {
            Ok(payload) => {
                // Failure is already logged by publish.
                let _ = self
                    .publish(&self.inner.status_topic, payload, PublishOptions::retained())
                    .await;
            }
            Err(err) => tracing::error!(%err, "failed to encode status report"),
        }

        if handshake.restore {
            self.resubscribe().await;
        }
    }

    async fn resubscribe(&self) {
        let subscriptions = self.subscriptions();
        if subscriptions.is_empty() {
            return;
        }
        tracing::info!(count = subscriptions.len(), "restoring subscriptions");
        for sub in subscriptions {
            let filter = vec![sub.filter.render(&self.inner.config.topic_prefix)];
            if let Err(err) = self.inner.transport.subscribe(filter, sub.qos).await {
                tracing::error!(%err, filter = %sub.filter, "failed to restore subscription");
            }
        }
    }

    fn on_connection_lost(&self, reason: &str) {
        self.inner.connected.store(false, Ordering::Release);
        tracing::warn!(reason, "bus connection lost, transport will reconnect");
    }

    fn inbound(&self, raw: RawMessage) -> Option<Message> {
        tracing::debug!(
            topic = %raw.topic,
            payload = %String::from_utf8_lossy(&raw.payload),
            "received message"
        );
        let Some(topic) = Topic::strip_prefix(&self.inner.config.topic_prefix, &raw.topic) else {
            tracing::debug!(topic = %raw.topic, "dropping message outside topic prefix");
            return None;
        };
        Some(Message {
            topic,
            payload: raw.payload,
            retain: raw.retain,
            qos: raw.qos,
        })
    }

    fn render_all(&self, topics: &[Topic]) -> Vec<String> {
        topics
            .iter()
            .map(|t| t.render(&self.inner.config.topic_prefix))
            .collect()
    }

    fn lock_subscriptions(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A handshake whose `up` report has not been published yet.
#[derive(Debug, Clone, Copy)]
struct Handshake {
    session_present: bool,
    restore: bool,
}

/// Inbound side of a [`BusSession`].
pub struct SessionEvents<T, E> {
    session: BusSession<T>,
    events: E,
    pending: Option<Handshake>,
}

impl<T: Transport, E: TransportEvents> SessionEvents<T, E> {
    /// Wait for the next session event.
    ///
    /// Connection handshakes are turned into a published `up` status (and
    /// restored subscriptions) before [`SessionEvent::Connected`] is returned.
    /// Returns `None` once the transport is closed for good.
    ///
    /// Cancel safe: a handshake interrupted while publishing is completed by
    /// the next call, which then returns its [`SessionEvent::Connected`].
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            if let Some(handshake) = self.pending {
                self.session.complete_handshake(handshake).await;
                self.pending = None;
                return Some(SessionEvent::Connected {
                    session_present: handshake.session_present,
                });
            }
            match self.events.next_event().await? {
                TransportEvent::Connected { session_present } => {
                    self.pending = Some(self.session.on_connected(session_present));
                }
                TransportEvent::Message(raw) => {
                    if let Some(message) = self.session.inbound(raw) {
                        return Some(SessionEvent::Message(message));
                    }
                }
                TransportEvent::ConnectionLost { reason } => {
                    self.session.on_connection_lost(&reason);
                    return Some(SessionEvent::Disconnected);
                }
            }
        }
    }

    /// The session these events belong to.
    #[must_use]
    pub fn session(&self) -> &BusSession<T> {
        &self.session
    }
}
