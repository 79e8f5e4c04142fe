//! Error types for device communication

/// Communication failure while talking to a device
///
/// Raised by every fallible [`Device`](crate::Device) call when the bulb
/// times out, cannot be reached, or answers with something unparseable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// No reply within the transport's retry budget
    #[error("Timed out waiting for {0}")]
    Timeout(String),

    /// Host unreachable or socket failure
    #[error("Device unreachable: {0}")]
    Unreachable(String),

    /// The reply could not be decoded
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl DeviceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeviceError::Timeout(_))
    }
}

/// Convenience Result type alias for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_display() {
        let error = DeviceError::Timeout("Kitchen".to_string());
        assert_eq!(error.to_string(), "Timed out waiting for Kitchen");
        assert!(error.is_timeout());

        let error = DeviceError::Unreachable("192.168.1.40".to_string());
        assert_eq!(error.to_string(), "Device unreachable: 192.168.1.40");
        assert!(!error.is_timeout());

        let error = DeviceError::MalformedResponse("short packet".to_string());
        assert_eq!(error.to_string(), "Malformed response: short packet");
    }
}
