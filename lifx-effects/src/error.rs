//! Error types for lifx-effects

use lifx_device::DeviceError;

/// Errors raised while producing or applying effect colors
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    /// The color source could not produce a color
    #[error("Color source failed: {0}")]
    Source(String),

    /// Pushing the color to the device failed
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// The runner is already driving its device
    #[error("Effect is already running")]
    AlreadyRunning,

    /// The effect thread could not be spawned
    #[error("Failed to spawn effect thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Convenience type alias for Results using EffectError.
pub type Result<T> = std::result::Result<T, EffectError>;
