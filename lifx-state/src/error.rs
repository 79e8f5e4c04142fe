//! Error types for lifx-state

use lifx_device::DeviceError;

/// Result type for lifx-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors that can occur during state synchronization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Label was never registered
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// Polling worker is already running
    #[error("Polling worker is already running")]
    AlreadyRunning,

    /// Polling worker has been stopped and cannot be restarted
    #[error("Polling worker has been stopped")]
    WorkerStopped,

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The background thread could not be spawned
    #[error("Failed to spawn polling thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// Error from a device call
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}
