//! Driver lifecycle: the contract every hardware bridge implements, and the
//! loop that runs one.
//!
//! [`run`] calls the hooks in this order:
//!
//! 1. [`init`](Driver::init): immediately, before the bus is connected
//! 2. [`run`](Driver::run): once, after the first successful handshake
//! 3. [`on_message`](Driver::on_message): for every inbound message, one at a time
//! 4. [`shutdown`](Driver::shutdown): on [`Signal::Interrupt`], before the session closes
//!
//! [`reload`](Driver::reload) is called on every [`Signal::Hangup`].

use std::future::Future;

use tokio::sync::mpsc;

use hap_domain::error::HapError;
use hap_domain::message::Message;

use crate::ports::{Transport, TransportEvents};
use crate::session::{BusSession, SessionEvent, SessionEvents};

/// Process control signals forwarded to a running driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Stop: flush hardware, then disconnect.
    Interrupt,
    /// Reload whatever the driver can reload.
    Hangup,
}

/// A bridge between one class of hardware and the bus.
pub trait Driver<T: Transport>: Send {
    /// Short name used in logs and as the default driver id suffix.
    fn name(&self) -> &'static str;

    /// Prepare the driver. The session is not connected yet.
    fn init(
        &mut self,
        session: &BusSession<T>,
    ) -> impl Future<Output = Result<(), HapError>> + Send;

    /// Start working: subscribe, open hardware. Called once.
    fn run(
        &mut self,
        session: &BusSession<T>,
    ) -> impl Future<Output = Result<(), HapError>> + Send;

    /// Handle one inbound message. Errors are logged by the caller.
    fn on_message(
        &mut self,
        session: &BusSession<T>,
        message: &Message,
    ) -> impl Future<Output = Result<(), HapError>> + Send;

    /// Release hardware before the session closes. No-op by default.
    fn shutdown(
        &mut self,
        _session: &BusSession<T>,
    ) -> impl Future<Output = Result<(), HapError>> + Send {
        async { Ok(()) }
    }

    /// React to a hang-up signal. No-op by default.
    fn reload(
        &mut self,
        _session: &BusSession<T>,
    ) -> impl Future<Output = Result<(), HapError>> + Send {
        async { Ok(()) }
    }
}

/// Drive `driver` until it is interrupted or the transport closes.
///
/// Session events are preferred over signals, so messages already received
/// are handled before a pending interrupt. A signal arriving mid-handshake
/// does not lose it: [`SessionEvents::next`] resumes the handshake on the
/// following turn. A closed signal channel counts as an interrupt.
///
/// # Errors
///
/// Returns the error of a failing [`init`](Driver::init) or
/// [`run`](Driver::run). Message and shutdown failures are only logged.
#[tracing::instrument(skip_all, fields(driver = driver.name(), driver_id = %session.driver_id()))]
pub async fn run<D, T, E>(
    mut driver: D,
    session: BusSession<T>,
    mut events: SessionEvents<T, E>,
    mut signals: mpsc::Receiver<Signal>,
) -> Result<(), HapError>
where
    D: Driver<T>,
    T: Transport,
    E: TransportEvents,
{
    driver.init(&session).await?;
    tracing::info!("driver initialised");

    let mut started = false;
    loop {
        tokio::select! {
            biased;
            event = events.next() => match event {
                Some(SessionEvent::Connected { .. }) if !started => {
                    started = true;
                    if let Err(err) = driver.run(&session).await {
                        tracing::error!(%err, "driver failed to start");
                        close(&session).await;
                        return Err(err);
                    }
                    tracing::info!("driver running");
                }
                Some(SessionEvent::Connected { .. } | SessionEvent::Disconnected) => {}
                Some(SessionEvent::Message(message)) => {
                    if let Err(err) = driver.on_message(&session, &message).await {
                        tracing::error!(%err, topic = %message.topic, "failed to handle message");
                    }
                }
                None => {
                    tracing::info!("transport closed");
                    return Ok(());
                }
            },
            signal = signals.recv() => match signal {
                Some(Signal::Hangup) => {
                    tracing::info!("reloading driver");
                    if let Err(err) = driver.reload(&session).await {
                        tracing::error!(%err, "failed to reload driver");
                    }
                }
                Some(Signal::Interrupt) | None => {
                    tracing::info!("stopping driver");
                    if let Err(err) = driver.shutdown(&session).await {
                        tracing::error!(%err, "driver shutdown failed");
                    }
                    close(&session).await;
                    return Ok(());
                }
            },
        }
    }
}

async fn close<T: Transport>(session: &BusSession<T>) {
    if let Err(err) = session.close().await {
        tracing::error!(%err, "failed to close session");
    }
}
