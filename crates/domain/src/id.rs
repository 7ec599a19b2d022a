//! Typed identifier newtypes backed by strings.
//!
//! Hardware ids come from the RF decoder or device configuration
//! (e.g. `0x00F0A1-1`), logical names are the human-readable names used in
//! topics (e.g. `hall_light`).

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a string value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is the empty string.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Hardware identifier of a [`Device`](crate::device::Device).
    HardwareId
);

define_id!(
    /// Human-readable, unique device name used in topics.
    LogicalName
);

define_id!(
    /// Name of a group of devices that respond together to a remote action.
    GroupName
);

define_id!(
    /// Identifier of a running driver process, also used as the bus client id.
    DriverId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn should_display_inner_string() {
        let id = HardwareId::new("0x00F0A1-1");
        assert_eq!(id.to_string(), "0x00F0A1-1");
    }

    #[test]
    fn should_serialize_transparently() {
        let name = LogicalName::from("hall_light");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"hall_light\"");
    }

    #[test]
    fn should_lookup_hash_map_by_str() {
        let mut map = HashMap::new();
        map.insert(GroupName::from("downstairs"), 3);
        assert_eq!(map.get("downstairs"), Some(&3));
    }

    #[test]
    fn should_report_empty() {
        assert!(DriverId::new("").is_empty());
        assert!(!DriverId::new("home-lighting").is_empty());
    }
}
