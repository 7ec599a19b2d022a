//! Device registry: read-only lookup over statically configured devices.
//!
//! Built once from configuration. "Not found" is an ordinary, frequent
//! outcome and is reported as `None`, never as an error.

use std::collections::HashMap;

use serde::Deserialize;

use crate::device::Device;
use crate::error::{HapError, ValidationError};
use crate::id::{GroupName, HardwareId, LogicalName};

/// One device entry as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceSpec {
    /// Hardware identifier.
    pub id: String,
    /// Unique logical name.
    pub name: String,
    /// Optional group membership.
    #[serde(default)]
    pub group: Option<String>,
    /// Whether the device supports dimming.
    #[serde(default)]
    pub dimming: bool,
}

/// Mapping between hardware ids, logical names and groups.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    by_id: HashMap<HardwareId, usize>,
    by_name: HashMap<LogicalName, usize>,
}

impl DeviceRegistry {
    /// Build a registry from devices in configuration order.
    ///
    /// # Errors
    ///
    /// Returns [`HapError::Validation`] when a hardware id or logical name
    /// appears twice.
    pub fn new(devices: Vec<Device>) -> Result<Self, HapError> {
        let mut by_id = HashMap::with_capacity(devices.len());
        let mut by_name = HashMap::with_capacity(devices.len());

        for (index, device) in devices.iter().enumerate() {
            if by_id.insert(device.hardware_id.clone(), index).is_some() {
                return Err(
                    ValidationError::DuplicateHardwareId(device.hardware_id.to_string()).into(),
                );
            }
            if by_name.insert(device.logical_name.clone(), index).is_some() {
                return Err(ValidationError::DuplicateName(device.logical_name.to_string()).into());
            }
        }

        Ok(Self {
            devices,
            by_id,
            by_name,
        })
    }

    /// Build a registry from configuration entries.
    ///
    /// # Errors
    ///
    /// Returns [`HapError::Validation`] if an entry is invalid or duplicated.
    pub fn from_specs(specs: &[DeviceSpec]) -> Result<Self, HapError> {
        let devices = specs
            .iter()
            .map(|spec| {
                let mut builder = Device::builder()
                    .hardware_id(spec.id.as_str())
                    .logical_name(spec.name.as_str())
                    .dimmable(spec.dimming);
                if let Some(group) = &spec.group {
                    builder = builder.group(group.as_str());
                }
                builder.build()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(devices)
    }

    /// Look up a device by hardware id.
    #[must_use]
    pub fn by_hardware_id(&self, id: &str) -> Option<&Device> {
        self.by_id.get(id).map(|&index| &self.devices[index])
    }

    /// Look up the hardware id of a device by logical name.
    #[must_use]
    pub fn by_logical_name(&self, name: &str) -> Option<&HardwareId> {
        self.device_by_name(name).map(|device| &device.hardware_id)
    }

    /// Look up a device by logical name.
    #[must_use]
    pub fn device_by_name(&self, name: &str) -> Option<&Device> {
        self.by_name.get(name).map(|&index| &self.devices[index])
    }

    /// All devices of `group`, in configuration order.
    #[must_use]
    pub fn group_members(&self, group: &GroupName) -> Vec<&Device> {
        self.devices.iter().filter(|d| d.in_group(group)).collect()
    }

    /// Mutable access for updating the cached level.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Device> {
        self.by_id.get(id).map(|&index| &mut self.devices[index])
    }

    /// Iterate over all devices in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
