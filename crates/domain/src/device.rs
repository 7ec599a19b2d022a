//! Device: a statically configured piece of hardware bridged onto the bus.

use serde::Serialize;

use crate::error::{HapError, ValidationError};
use crate::id::{GroupName, HardwareId, LogicalName};
use crate::level::Level;

/// A configured device.
///
/// Identity is the [`HardwareId`]. Everything except `last_level` is fixed
/// for the lifetime of the process; `last_level` is only updated by the
/// command reconciler after a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub hardware_id: HardwareId,
    pub logical_name: LogicalName,
    pub group: Option<GroupName>,
    pub dimmable: bool,
    last_level: Level,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HapError::Validation`] when:
    /// - `hardware_id` is empty ([`ValidationError::EmptyHardwareId`])
    /// - `logical_name` is empty ([`ValidationError::EmptyName`])
    pub fn validate(&self) -> Result<(), HapError> {
        if self.hardware_id.is_empty() {
            return Err(ValidationError::EmptyHardwareId.into());
        }
        if self.logical_name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// The level recorded by the last successful command.
    #[must_use]
    pub fn last_level(&self) -> Level {
        self.last_level
    }

    /// Record the level of a successfully dispatched command.
    pub fn record_level(&mut self, level: Level) {
        self.last_level = level;
    }

    /// Whether this device shares `group` with the given name.
    #[must_use]
    pub fn in_group(&self, group: &GroupName) -> bool {
        self.group.as_ref() == Some(group)
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    hardware_id: Option<HardwareId>,
    logical_name: Option<LogicalName>,
    group: Option<GroupName>,
    dimmable: bool,
}

impl DeviceBuilder {
    #[must_use]
    pub fn hardware_id(mut self, id: impl Into<HardwareId>) -> Self {
        self.hardware_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn logical_name(mut self, name: impl Into<LogicalName>) -> Self {
        self.logical_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn group(mut self, group: impl Into<GroupName>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn dimmable(mut self, dimmable: bool) -> Self {
        self.dimmable = dimmable;
        self
    }

    /// Consume the builder, validate, and return a [`Device`] with
    /// `last_level` at [`Level::OFF`].
    ///
    /// # Errors
    ///
    /// Returns [`HapError::Validation`] if the hardware id or logical name
    /// is missing or empty.
    pub fn build(self) -> Result<Device, HapError> {
        let device = Device {
            hardware_id: self.hardware_id.unwrap_or_else(|| HardwareId::new("")),
            logical_name: self.logical_name.unwrap_or_else(|| LogicalName::new("")),
            group: self.group,
            dimmable: self.dimmable,
            last_level: Level::OFF,
        };
        device.validate()?;
        Ok(device)
    }
}
