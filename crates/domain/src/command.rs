//! Set-command vocabulary and its translation into hardware actions.
//!
//! Accepted payloads on a `.../set` topic:
//!
//! | Payload | Action | Status | Level |
//! |---------|--------|--------|-------|
//! | `on` (dimmable) | dim to 15 | `on` | 15 |
//! | `on` (binary) | on | `on` | 15 (not reported) |
//! | `off`, `0` | off | `off` | 0 |
//! | `1`..=`15` | dim to n | `on` | n |
//!
//! Anything else is invalid.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::level::Level;
use crate::payload::Revertive;

/// A validated set command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCommand {
    On,
    Off,
    Level(Level),
}

impl FromStr for SetCommand {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("on") {
            return Ok(Self::On);
        }
        if trimmed.eq_ignore_ascii_case("off") {
            return Ok(Self::Off);
        }
        let value: i64 = trimmed
            .parse()
            .map_err(|_| ValidationError::InvalidCommand(s.to_string()))?;
        let level =
            Level::try_from(value).map_err(|_| ValidationError::InvalidCommand(s.to_string()))?;
        if level.is_off() {
            Ok(Self::Off)
        } else {
            Ok(Self::Level(level))
        }
    }
}

/// The hardware action a command translates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    On,
    Off,
    Dim(Level),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Dim(level) => write!(f, "dim({level})"),
        }
    }
}

/// Binary state reported in a revertive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchStatus {
    On,
    Off,
}

impl fmt::Display for SwitchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// Result of translating a [`SetCommand`] for a particular device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    /// What to ask the hardware to do.
    pub action: Action,
    /// Confirmed status.
    pub status: SwitchStatus,
    /// Level to cache on the device.
    pub level: Level,
    /// Whether `level` is part of the confirmation.
    pub report_level: bool,
}

impl Translation {
    /// The revertive confirming this translation.
    #[must_use]
    pub fn revertive(&self) -> Revertive {
        let level = self.report_level.then_some(self.level);
        Revertive::new(self.status.to_string(), level)
    }
}

impl SetCommand {
    /// Translate against the device capability.
    #[must_use]
    pub fn translate(self, dimmable: bool) -> Translation {
        match self {
            Self::On if dimmable => Translation {
                action: Action::Dim(Level::FULL),
                status: SwitchStatus::On,
                level: Level::FULL,
                report_level: true,
            },
            Self::On => Translation {
                action: Action::On,
                status: SwitchStatus::On,
                level: Level::FULL,
                report_level: false,
            },
            Self::Off => Translation {
                action: Action::Off,
                status: SwitchStatus::Off,
                level: Level::OFF,
                report_level: true,
            },
            Self::Level(level) => Translation {
                action: Action::Dim(level),
                status: SwitchStatus::On,
                level,
                report_level: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(v: u8) -> Level {
        Level::new(v).unwrap()
    }

    #[test]
    fn should_parse_on_and_off_case_insensitively() {
        assert_eq!("ON".parse::<SetCommand>().unwrap(), SetCommand::On);
        assert_eq!("Off".parse::<SetCommand>().unwrap(), SetCommand::Off);
    }

    #[test]
    fn should_parse_zero_as_off() {
        assert_eq!("0".parse::<SetCommand>().unwrap(), SetCommand::Off);
    }

    #[test]
    fn should_accept_every_level_between_one_and_fifteen() {
        for v in 1..=15u8 {
            assert_eq!(
                v.to_string().parse::<SetCommand>().unwrap(),
                SetCommand::Level(level(v))
            );
        }
    }

    #[test]
    fn should_reject_values_outside_range_and_unknown_words() {
        for payload in ["16", "-1", "7.5", "dim", "", "onn"] {
            assert_eq!(
                payload.parse::<SetCommand>(),
                Err(ValidationError::InvalidCommand(payload.to_string())),
                "payload {payload:?}"
            );
        }
    }

    #[test]
    fn should_translate_on_to_full_dim_for_dimmable_device() {
        let t = SetCommand::On.translate(true);
        assert_eq!(t.action, Action::Dim(Level::FULL));
        assert_eq!(t.status, SwitchStatus::On);
        assert_eq!(t.revertive().level, Some(Level::FULL));
    }

    #[test]
    fn should_translate_on_to_plain_on_without_level_for_binary_device() {
        let t = SetCommand::On.translate(false);
        assert_eq!(t.action, Action::On);
        assert_eq!(t.level, Level::FULL);
        assert_eq!(t.revertive().level, None);
    }

    #[test]
    fn should_translate_off_to_level_zero() {
        for dimmable in [true, false] {
            let t = SetCommand::Off.translate(dimmable);
            assert_eq!(t.action, Action::Off);
            assert_eq!(t.revertive(), Revertive::new("off", Some(Level::OFF)));
        }
    }

    #[test]
    fn should_translate_level_to_dim() {
        let t = SetCommand::Level(level(7)).translate(true);
        assert_eq!(t.action, Action::Dim(level(7)));
        assert_eq!(t.revertive(), Revertive::new("on", Some(level(7))));
    }

    #[test]
    fn should_display_actions() {
        assert_eq!(Action::Dim(level(3)).to_string(), "dim(3)");
        assert_eq!(Action::Off.to_string(), "off");
    }
}
