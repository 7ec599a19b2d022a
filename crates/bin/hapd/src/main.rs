//! # hapd: hap driver daemon
//!
//! Composition root that connects one driver to the bus and runs it until
//! it is interrupted.
//!
//! ## Responsibilities
//! - Parse the command line and configuration (file, then env vars)
//! - Initialise logging
//! - Connect a [`BusSession`] to the MQTT broker, prefixed by the house id
//! - Construct the selected driver from its configuration section
//! - Forward SIGINT/SIGTERM as [`Signal::Interrupt`] and SIGHUP as
//!   [`Signal::Hangup`]
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod cli;
mod config;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use hap_adapter_caplog::CaplogDriver;
use hap_adapter_mqtt::{MqttConnector, MqttTransport};
use hap_adapter_relay::RelayDriver;
use hap_adapter_rf::{LightingDriver, SensorDriver};
use hap_adapter_salvo::SalvoDriver;
use hap_app::driver::{self, Driver, Signal};
use hap_app::session::{BusSession, SessionConfig};

use crate::cli::{Args, DriverKind};
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load().context("failed to load configuration")?;
    init_logging(&config, args.debug);

    let session_config =
        SessionConfig::new(args.session_id(&config.global.house_id), config.global.house_id.clone())
            .with_revertive_qos(config.mqtt.revertive_qos);
    let connector = MqttConnector::new(config.mqtt.clone());

    let (signals_tx, signals) = mpsc::channel(4);
    let forwarder = tokio::spawn(forward_signals(signals_tx.clone()));

    let result = match args.driver {
        DriverKind::Lighting => {
            start(LightingDriver::new(config.lighting), connector, session_config, signals).await
        }
        DriverKind::Sensors => {
            start(SensorDriver::new(config.sensors), connector, session_config, signals).await
        }
        DriverKind::Relay => {
            start(RelayDriver::new(config.relay), connector, session_config, signals).await
        }
        DriverKind::Salvo => {
            start(SalvoDriver::new(config.salvo), connector, session_config, signals).await
        }
        DriverKind::Caplog => start(CaplogDriver::new(), connector, session_config, signals).await,
    };

    forwarder.abort();
    drop(signals_tx);
    result.with_context(|| format!("{} driver stopped", args.driver))
}

fn init_logging(config: &Config, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn start<D>(
    driver: D,
    connector: MqttConnector,
    session_config: SessionConfig,
    signals: mpsc::Receiver<Signal>,
) -> anyhow::Result<()>
where
    D: Driver<MqttTransport>,
{
    tracing::info!(
        driver = driver.name(),
        driver_id = %session_config.driver_id,
        "starting driver"
    );
    let (session, events) = BusSession::connect(connector, session_config)
        .context("failed to connect to the broker")?;
    driver::run(driver, session, events, signals).await?;
    tracing::info!("driver stopped");
    Ok(())
}

#[cfg(unix)]
async fn forward_signals(tx: mpsc::Sender<Signal>) {
    use tokio::signal::unix::{SignalKind, signal};

    let streams = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    );
    let (Ok(mut interrupt), Ok(mut terminate), Ok(mut hangup)) = streams else {
        tracing::error!("failed to install signal handlers");
        return;
    };

    loop {
        let received = tokio::select! {
            _ = interrupt.recv() => Signal::Interrupt,
            _ = terminate.recv() => Signal::Interrupt,
            _ = hangup.recv() => Signal::Hangup,
        };
        tracing::info!(signal = ?received, "signal received");
        if tx.send(received).await.is_err() || received == Signal::Interrupt {
            return;
        }
    }
}

#[cfg(not(unix))]
async fn forward_signals(tx: mpsc::Sender<Signal>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!("ctrl-c received");
    let _ = tx.send(Signal::Interrupt).await;
}
