//! Command-line arguments.

use std::fmt;

use clap::{Parser, ValueEnum};

/// Drivers this binary can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DriverKind {
    /// RF switches and dimmers.
    Lighting,
    /// RF temperature sensors and power meters.
    Sensors,
    /// LC-Technology network relays.
    Relay,
    /// Scenes fired by a trigger value.
    Salvo,
    /// Log every message on the bus.
    Caplog,
}

impl DriverKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lighting => "lighting",
            Self::Sensors => "sensors",
            Self::Relay => "relay",
            Self::Salvo => "salvo",
            Self::Caplog => "caplog",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "hapd",
    about = "Run one hap driver against the MQTT bus",
    version
)]
pub struct Args {
    /// Driver to run.
    #[arg(value_enum)]
    pub driver: DriverKind,

    /// Suffix of the driver id; defaults to the driver name.
    #[arg(long)]
    pub driver_id: Option<String>,

    /// Force the `debug` log filter.
    #[arg(short, long)]
    pub debug: bool,
}

impl Args {
    /// Session client id: `<house_id>-<driver id or driver name>`.
    #[must_use]
    pub fn session_id(&self, house_id: &str) -> String {
        let suffix = self
            .driver_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(self.driver.as_str());
        format!("{house_id}-{suffix}")
    }
}
