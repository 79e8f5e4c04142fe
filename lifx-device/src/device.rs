//! Device capability interface
//!
//! Everything the rest of the workspace knows about a bulb goes through the
//! [`Device`] trait. Discovery and the LAN wire protocol live behind it.

use std::time::Duration;

use crate::{Color, DeviceLabel, KelvinRange, Power, Result};

/// A bulb, strip or group reachable on the local network
///
/// All getters perform network I/O and may block; they fail with
/// [`DeviceError`](crate::DeviceError) on timeout, unreachable host or a
/// malformed reply. Implementations must be shareable across threads since the
/// poller queries devices in parallel.
pub trait Device: Send + Sync {
    /// Read the device label
    fn label(&self) -> Result<DeviceLabel>;

    fn get_power(&self) -> Result<Power>;

    fn get_color(&self) -> Result<Color>;

    /// Colors of every zone on a multizone strip
    ///
    /// Single-zone devices report their one color.
    fn get_color_zones(&self) -> Result<Vec<Color>> {
        Ok(vec![self.get_color()?])
    }

    fn supports_multizone(&self) -> bool {
        false
    }

    /// Whether this handle addresses a group of bulbs rather than one bulb
    fn is_group(&self) -> bool {
        false
    }

    fn kelvin_range(&self) -> KelvinRange {
        KelvinRange::default()
    }

    fn set_power(&self, power: Power, duration: Duration) -> Result<()>;

    /// Change the color over `duration`
    ///
    /// `rapid` requests fire-and-forget delivery without acknowledgement, used
    /// by effects that push many frames per second.
    fn set_color(&self, color: Color, duration: Duration, rapid: bool) -> Result<()>;
}

/// Read the color used to represent a device in one value
///
/// Multizone strips are represented by their first zone; an empty zone list
/// falls back to the plain color query.
pub fn representative_color(device: &dyn Device) -> Result<Color> {
    if device.supports_multizone() {
        if let Some(first) = device.get_color_zones()?.into_iter().next() {
            return Ok(first);
        }
    }
    device.get_color()
}
