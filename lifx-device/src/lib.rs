//! LIFX device capabilities
//!
//! Value types and the [`Device`] trait shared by the state poller and the
//! effect runners. The LAN protocol itself is not part of this crate; any
//! client library can be adapted by implementing [`Device`].
//!
//! ```rust,ignore
//! use lifx_device::{Color, Device, Power};
//!
//! fn describe(device: &dyn Device) -> lifx_device::Result<String> {
//!     let power = device.get_power()?;
//!     let color = device.get_color()?;
//!     Ok(format!("{} is {} at {}", device.label()?, power, color))
//! }
//! ```

mod color;
mod device;
mod error;
mod label;
mod power;

#[cfg(any(test, feature = "test-support"))]
pub mod dummy;

pub use color::{Color, KelvinRange};
pub use device::{representative_color, Device};
pub use error::{DeviceError, Result};
pub use label::DeviceLabel;
pub use power::Power;
