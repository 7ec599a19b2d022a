//! `rumqttc`-backed implementation of the transport ports.
//!
//! The event loop is owned by a background task. Requests issued through
//! [`MqttTransport`] are queued on the client channel and written by that
//! task, so publishing from inside a message handler never waits on a loop
//! nobody is polling.

use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet, QoS,
    SubscribeFilter,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use hap_app::ports::{
    ConnectOptions, Connector, RawMessage, Transport, TransportEvent, TransportEvents,
};
use hap_domain::error::HapError;
use hap_domain::message::Qos;

use crate::config::MqttConfig;
use crate::error::MqttError;

/// Opens MQTT connections.
#[derive(Debug, Clone)]
pub struct MqttConnector {
    config: MqttConfig,
}

/// Request side of an MQTT connection.
#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
}

/// Event side of an MQTT connection.
pub struct MqttEvents {
    events: mpsc::Receiver<TransportEvent>,
    task: JoinHandle<()>,
}

impl MqttConnector {
    #[must_use]
    pub fn new(config: MqttConfig) -> Self {
        Self { config }
    }

    fn options(&self, options: ConnectOptions) -> MqttOptions {
        let mut mqtt = MqttOptions::new(
            options.client_id,
            self.config.broker_host.clone(),
            self.config.broker_port,
        );
        mqtt.set_keep_alive(self.config.keep_alive());
        mqtt.set_clean_session(true);
        if let Some((user, pass)) = self.config.credentials() {
            mqtt.set_credentials(user, pass);
        }
        let will = options.last_will;
        mqtt.set_last_will(LastWill::new(
            will.topic,
            will.payload,
            to_mqtt_qos(will.qos),
            will.retain,
        ));
        mqtt
    }
}

impl Connector for MqttConnector {
    type Transport = MqttTransport;
    type Events = MqttEvents;

    fn connect(self, options: ConnectOptions) -> Result<(MqttTransport, MqttEvents), HapError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| MqttError::NoRuntime)?;

        tracing::info!(
            host = %self.config.broker_host,
            port = self.config.broker_port,
            client_id = %options.client_id,
            "connecting to MQTT broker"
        );
        let capacity = self.config.channel_capacity.max(1);
        let (client, eventloop) = AsyncClient::new(self.options(options), capacity);
        let (tx, rx) = mpsc::channel(capacity);
        let task = runtime.spawn(poll(eventloop, tx, self.config.reconnect_delay()));

        Ok((MqttTransport { client }, MqttEvents { events: rx, task }))
    }
}

impl Transport for MqttTransport {
    async fn subscribe(&self, filters: Vec<String>, qos: Qos) -> Result<(), HapError> {
        if filters.is_empty() {
            return Ok(());
        }
        let qos = to_mqtt_qos(qos);
        let filters = filters
            .into_iter()
            .map(|path| SubscribeFilter::new(path, qos));
        self.client
            .subscribe_many(filters)
            .await
            .map_err(|err| MqttError::from(err).into_domain())
    }

    async fn publish(&self, message: RawMessage) -> Result<(), HapError> {
        self.client
            .publish(
                message.topic,
                to_mqtt_qos(message.qos),
                message.retain,
                message.payload,
            )
            .await
            .map_err(|err| MqttError::from(err).into_domain())
    }

    async fn disconnect(&self) -> Result<(), HapError> {
        self.client
            .disconnect()
            .await
            .map_err(|err| MqttError::from(err).into_domain())
    }
}

impl TransportEvents for MqttEvents {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }
}

impl Drop for MqttEvents {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Poll the event loop until the connection is closed for good or nobody
/// listens any more.
async fn poll(mut eventloop: EventLoop, tx: mpsc::Sender<TransportEvent>, delay: Duration) {
    loop {
        let event = match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => TransportEvent::Connected {
                session_present: ack.session_present,
            },
            Ok(Event::Incoming(Packet::Publish(publish))) => TransportEvent::Message(RawMessage {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
                qos: from_mqtt_qos(publish.qos),
                retain: publish.retain,
            }),
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!("disconnect sent, stopping event loop");
                return;
            }
            Ok(_) => continue,
            Err(ConnectionError::RequestsDone) => {
                tracing::debug!("all clients dropped, stopping event loop");
                return;
            }
            Err(err) => {
                tracing::warn!(%err, retry_in = ?delay, "MQTT connection error");
                if tx
                    .send(TransportEvent::ConnectionLost {
                        reason: err.to_string(),
                    })
                    .await
                    .is_err()
                {
                    return;
                }
                tokio::time::sleep(delay).await;
                continue;
            }
        };
        if tx.send(event).await.is_err() {
            tracing::debug!("event receiver dropped, stopping event loop");
            return;
        }
    }
}

fn to_mqtt_qos(qos: Qos) -> QoS {
    match qos {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
        Qos::ExactlyOnce => QoS::ExactlyOnce,
    }
}

fn from_mqtt_qos(qos: QoS) -> Qos {
    match qos {
        QoS::AtMostOnce => Qos::AtMostOnce,
        QoS::AtLeastOnce => Qos::AtLeastOnce,
        QoS::ExactlyOnce => Qos::ExactlyOnce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ConnectOptions {
        ConnectOptions {
            client_id: "home-lighting".to_string(),
            last_will: RawMessage {
                topic: "home/system/status/home-lighting".to_string(),
                payload: br#"{"status":"down"}"#.to_vec(),
                qos: Qos::AtMostOnce,
                retain: true,
            },
        }
    }

    #[test]
    fn should_map_qos_levels_both_ways() {
        for qos in [Qos::AtMostOnce, Qos::AtLeastOnce, Qos::ExactlyOnce] {
            assert_eq!(from_mqtt_qos(to_mqtt_qos(qos)), qos);
        }
    }

    #[test]
    fn should_register_last_will() {
        let connector = MqttConnector::new(MqttConfig::default());
        let mqtt = connector.options(options());
        let will = mqtt.last_will().unwrap();
        assert_eq!(will.topic, "home/system/status/home-lighting");
        assert!(will.retain);
        assert_eq!(mqtt.client_id(), "home-lighting");
        assert_eq!(mqtt.keep_alive(), Duration::from_secs(30));
    }

    #[test]
    fn should_require_a_runtime() {
        let result = MqttConnector::new(MqttConfig::default()).connect(options());
        assert!(matches!(result, Err(HapError::Transport(_))));
    }

    #[tokio::test]
    async fn should_report_connection_loss_when_broker_unreachable() {
        let config = MqttConfig {
            broker_host: "127.0.0.1".to_string(),
            broker_port: 1,
            reconnect_delay_secs: 60,
            ..MqttConfig::default()
        };
        let (_transport, mut events) = MqttConnector::new(config).connect(options()).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), events.next_event())
            .await
            .unwrap();
        assert!(matches!(event, Some(TransportEvent::ConnectionLost { .. })));
    }
}
