//! Dim level: the 0..=15 brightness scale used by RF lighting devices.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Brightness level in the inclusive range `0..=15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Level(u8);

impl Level {
    /// Fully off.
    pub const OFF: Self = Self(0);
    /// Fully on; also the level used when a dimmable device is switched on.
    pub const FULL: Self = Self(15);

    /// Create a level, rejecting values outside `0..=15`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::LevelOutOfRange`] when `value > 15`.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        Self::try_from(i64::from(value))
    }

    /// The raw level value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether this is [`Level::OFF`].
    #[must_use]
    pub fn is_off(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<i64> for Level {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::FULL.0)
            .map(Self)
            .ok_or(ValidationError::LevelOutOfRange(value))
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
