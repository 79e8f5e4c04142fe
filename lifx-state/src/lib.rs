//! LIFX State Synchronization
//!
//! Keeps a cached copy of every bulb's power and color and tells the UI what
//! changed, without the UI ever waiting on the network.
//!
//! # Architecture
//!
//! ```text
//! Device (network) ← PollingWorker → DeviceRegistry → UI consumer
//!                    (heartbeat)     (cache + queues)   (drain)
//! ```
//!
//! - [`DeviceRegistry`] owns, per device label, the last observed
//!   [`Power`](lifx_device::Power) and [`Color`](lifx_device::Color) plus one
//!   FIFO of pending changes for each.
//! - [`PollingWorker`] queries every registered device once per heartbeat, in
//!   parallel, and queues each value that differs from the cache.
//! - The UI drains the queues on its own timer.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lifx_state::{DeviceRegistry, PollerConfig, PollingWorker};
//!
//! let registry = DeviceRegistry::new();
//! registry.register(discovered_devices);
//!
//! let mut worker = PollingWorker::new(registry.clone(), PollerConfig::default())?;
//! worker.start()?;
//!
//! // On the UI timer:
//! for label in registry.labels() {
//!     while let Some(power) = registry.drain_power_queue(label.as_str())? {
//!         power_switch(&label).set(power.is_on());
//!     }
//!     while let Some(color) = registry.drain_color_queue(label.as_str())? {
//!         sliders(&label).set(color);
//!     }
//! }
//!
//! worker.stop()?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod poller;
pub mod registry;

pub use config::PollerConfig;
pub use error::{Result, StateError};
pub use logging::{
    init_logging, init_logging_from_env, is_initialized, LoggingError, LoggingMode,
};
pub use poller::{
    poll_tick, query_device, PollingStats, PollingWorker, QueryOutcome, TickReport, WorkerState,
};
pub use registry::{DeviceRegistry, DeviceSnapshot, PolledDevice};

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::config::PollerConfig;
    pub use crate::error::{Result, StateError};
    pub use crate::poller::{PollingWorker, WorkerState};
    pub use crate::registry::{DeviceRegistry, DeviceSnapshot};
    pub use lifx_device::{Color, Device, DeviceError, DeviceLabel, Power};
}
