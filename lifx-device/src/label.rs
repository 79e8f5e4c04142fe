//! Device label type

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique, user-assigned name of a bulb or group
///
/// Labels are the keys of every registry lookup. They are compared exactly,
/// so "Kitchen" and "kitchen" are two different devices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceLabel(String);

impl DeviceLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Get the label as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for DeviceLabel {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DeviceLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceLabel {
    fn from(s: &str) -> Self {
        DeviceLabel::new(s)
    }
}

impl From<String> for DeviceLabel {
    fn from(s: String) -> Self {
        DeviceLabel::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_labels_are_case_sensitive() {
        assert_ne!(DeviceLabel::new("Kitchen"), DeviceLabel::new("kitchen"));
    }

    #[test]
    fn test_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(DeviceLabel::new("Desk Lamp"), 1);
        assert_eq!(map.get("Desk Lamp"), Some(&1));
        assert!(map.get("Desk").is_none());
    }

    #[test]
    fn test_display() {
        let label: DeviceLabel = "Porch".into();
        assert_eq!(label.to_string(), "Porch");
        assert_eq!(label.as_str(), "Porch");
    }
}
