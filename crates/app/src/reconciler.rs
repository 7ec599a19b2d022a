//! Command reconciler: set commands → hardware actions → retained revertives.
//!
//! Inbound `.../<logicalName>/set` messages go through, in order:
//!
//! 1. clearing markers are ignored;
//! 2. the logical name is resolved against the [`DeviceRegistry`];
//! 3. retained echoes are cleared instead of being re-applied;
//! 4. the payload is validated and translated for the device capability;
//! 5. the device's last level is cached;
//! 6. the action is dispatched to the [`Actuator`], bounded by a timeout;
//! 7. a retained revertive is published on `<state base>/<logicalName>`.
//!
//! Remote-control events take the opposite direction: they never reach the
//! actuator, but fan out revertives to every member of the source's group.

use std::time::Duration;

use hap_domain::command::{Action, SetCommand};
use hap_domain::device::Device;
use hap_domain::error::HapError;
use hap_domain::event::{HardwareEvent, RemoteCommand};
use hap_domain::id::LogicalName;
use hap_domain::level::Level;
use hap_domain::message::Message;
use hap_domain::payload::{Revertive, is_clear_marker};
use hap_domain::registry::DeviceRegistry;
use hap_domain::topic::Topic;

use crate::event_publisher::{EventPublisher, Rejection};
use crate::ports::{Actuator, Transport};
use crate::session::BusSession;

/// Default upper bound on a single hardware dispatch.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// What happened to one inbound command or remote event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The topic is not a set command topic.
    NotACommand,
    /// The payload was a clearing marker.
    ClearMarker,
    /// No device with this logical name; `cleared` tells whether the
    /// retained command was removed.
    UnknownDevice { name: String, cleared: bool },
    /// A retained command was replayed by the broker and has been cleared.
    RetainedEcho(LogicalName),
    /// The payload is outside the command vocabulary; the topic was cleared.
    Invalid { device: LogicalName, payload: String },
    /// The command was applied and confirmed.
    Confirmed {
        device: LogicalName,
        action: Action,
        dispatched: bool,
    },
    /// A remote event was confirmed for these devices, in group order.
    Remote(Vec<LogicalName>),
    /// A remote event that could not be attributed.
    Rejected(Rejection),
}

/// Applies set commands for one driver's devices.
pub struct CommandReconciler<A> {
    registry: DeviceRegistry,
    actuator: A,
    state_base: Topic,
    dispatch_timeout: Duration,
}

impl<A: Actuator> CommandReconciler<A> {
    #[must_use]
    pub fn new(registry: DeviceRegistry, actuator: A, state_base: Topic) -> Self {
        Self {
            registry,
            actuator,
            state_base,
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    #[must_use]
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Topic the state of `name` is confirmed on.
    #[must_use]
    pub fn state_topic(&self, name: &LogicalName) -> Topic {
        self.state_base.join(name.as_str())
    }

    /// Apply one inbound set command.
    ///
    /// Never fails: every rejection is logged and reported in the [`Outcome`].
    #[tracing::instrument(skip(self, session, message), fields(topic = %message.topic))]
    pub async fn handle_set<T: Transport>(
        &mut self,
        session: &BusSession<T>,
        message: &Message,
    ) -> Outcome {
        let Some(name) = message.topic.set_target() else {
            tracing::debug!("not a set command topic");
            return Outcome::NotACommand;
        };
        if is_clear_marker(&message.payload) {
            tracing::debug!("ignoring clearing of retained command");
            return Outcome::ClearMarker;
        }
        let payload = message.text().into_owned();

        let Some(device) = self.registry.device_by_name(name) else {
            tracing::error!(device = name, %payload, "ignoring command for unknown device");
            let cleared = message.retain && self.clear(session, &message.topic).await;
            return Outcome::UnknownDevice {
                name: name.to_string(),
                cleared,
            };
        };
        let hardware_id = device.hardware_id.clone();
        let logical_name = device.logical_name.clone();

        if message.retain {
            tracing::info!(device = %logical_name, %payload, "clearing retained command");
            self.clear(session, &message.topic).await;
            return Outcome::RetainedEcho(logical_name);
        }

        let command = match payload.parse::<SetCommand>() {
            Ok(command) => command,
            Err(err) => {
                tracing::error!(device = %logical_name, %err, "invalid command, clearing topic");
                self.clear(session, &message.topic).await;
                return Outcome::Invalid {
                    device: logical_name,
                    payload,
                };
            }
        };
        let translation = command.translate(device.dimmable);

        let Some(device) = self.registry.get_mut(hardware_id.as_str()) else {
            return Outcome::UnknownDevice {
                name: name.to_string(),
                cleared: false,
            };
        };
        device.record_level(translation.level);
        let device = device.clone();

        tracing::info!(
            device = %logical_name,
            action = %translation.action,
            level = %translation.level,
            "setting device state"
        );
        let dispatched = self.dispatch(&device, translation.action).await;

        let topic = self.state_topic(&logical_name);
        match session.revertive(&topic, &translation.revertive()).await {
            Ok(()) => tracing::info!(
                device = %logical_name,
                status = %translation.status,
                "revertive sent"
            ),
            Err(err) => tracing::error!(%err, device = %logical_name, "failed to send revertive"),
        }

        Outcome::Confirmed {
            device: logical_name,
            action: translation.action,
            dispatched,
        }
    }

    /// Confirm a command received from a remote control.
    ///
    /// `Group <action>` commands fan out to every device sharing the source's
    /// group; other commands confirm the source alone. `on` reports each
    /// member's last level, `off` reports zero. Cached levels are not touched.
    #[tracing::instrument(skip_all, fields(id = ?event.hardware_id()))]
    pub async fn handle_remote<T: Transport>(
        &self,
        session: &BusSession<T>,
        event: &HardwareEvent,
    ) -> Outcome {
        let source = match EventPublisher::resolve(&self.registry, event) {
            Ok(device) => device,
            Err(rejection) => return Outcome::Rejected(rejection),
        };
        let Some(raw) = event.command.as_deref() else {
            tracing::error!(device = %source.logical_name, "remote event without command");
            return Outcome::Rejected(Rejection::MissingContent(source.hardware_id.clone()));
        };
        let command = RemoteCommand::parse(raw);

        let members = match (&source.group, command.group) {
            (Some(group), true) => {
                tracing::info!(%group, action = %command.action, "group changed via remote");
                self.registry.group_members(group)
            }
            _ => vec![source],
        };

        let status = command.status();
        let mut confirmed = Vec::with_capacity(members.len());
        for member in members {
            let level = if command.is_off() {
                Level::OFF
            } else {
                member.last_level()
            };
            let topic = self.state_topic(&member.logical_name);
            let revertive = Revertive::new(status.clone(), Some(level));
            match session.revertive(&topic, &revertive).await {
                Ok(()) => {
                    tracing::info!(
                        device = %member.logical_name,
                        %status,
                        %level,
                        "device set via remote"
                    );
                    confirmed.push(member.logical_name.clone());
                }
                Err(err) => {
                    tracing::error!(%err, device = %member.logical_name, "failed to send revertive");
                }
            }
        }
        Outcome::Remote(confirmed)
    }

    /// Flush pending hardware work.
    ///
    /// # Errors
    ///
    /// Returns whatever the actuator reports.
    pub async fn flush(&self) -> Result<(), HapError> {
        self.actuator.flush().await
    }

    async fn dispatch(&self, device: &Device, action: Action) -> bool {
        let result =
            match tokio::time::timeout(self.dispatch_timeout, self.actuator.dispatch(device, action))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(HapError::Timeout(self.dispatch_timeout)),
            };
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(%err, device = %device.logical_name, %action, "hardware dispatch failed");
                false
            }
        }
    }

    async fn clear<T: Transport>(&self, session: &BusSession<T>, topic: &Topic) -> bool {
        match session.clear(topic).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(%err, %topic, "failed to clear retained command");
                false
            }
        }
    }
}
