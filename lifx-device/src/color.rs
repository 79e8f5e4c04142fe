//! HSBK color value types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single color in HSBK space
///
/// Hue, saturation and brightness span the full `u16` range. Kelvin is only
/// meaningful inside the device's [`KelvinRange`]; it is stored as reported
/// and never clamped implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub hue: u16,
    pub saturation: u16,
    pub brightness: u16,
    pub kelvin: u16,
}

impl Color {
    pub const fn new(hue: u16, saturation: u16, brightness: u16, kelvin: u16) -> Self {
        Self {
            hue,
            saturation,
            brightness,
            kelvin,
        }
    }

    /// Same color with a different brightness
    pub fn with_brightness(self, brightness: u16) -> Self {
        Self { brightness, ..self }
    }

    /// Same color with a different color temperature
    pub fn with_kelvin(self, kelvin: u16) -> Self {
        Self { kelvin, ..self }
    }

    pub fn to_array(self) -> [u16; 4] {
        [self.hue, self.saturation, self.brightness, self.kelvin]
    }
}

impl Default for Color {
    /// Warm white at zero brightness
    fn default() -> Self {
        Self::new(0, 0, 0, KelvinRange::DEFAULT_MIN)
    }
}

impl From<[u16; 4]> for Color {
    fn from([hue, saturation, brightness, kelvin]: [u16; 4]) -> Self {
        Self::new(hue, saturation, brightness, kelvin)
    }
}

impl From<(u16, u16, u16, u16)> for Color {
    fn from((hue, saturation, brightness, kelvin): (u16, u16, u16, u16)) -> Self {
        Self::new(hue, saturation, brightness, kelvin)
    }
}

impl From<Color> for [u16; 4] {
    fn from(color: Color) -> Self {
        color.to_array()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.hue, self.saturation, self.brightness, self.kelvin
        )
    }
}

/// Color temperature range supported by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KelvinRange {
    pub min: u16,
    pub max: u16,
}

impl KelvinRange {
    pub const DEFAULT_MIN: u16 = 1500;
    pub const DEFAULT_MAX: u16 = 9000;

    /// Create a range; the bounds are swapped if given in reverse order
    pub fn new(min: u16, max: u16) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn contains(&self, kelvin: u16) -> bool {
        (self.min..=self.max).contains(&kelvin)
    }

    pub fn clamp(&self, kelvin: u16) -> u16 {
        kelvin.clamp(self.min, self.max)
    }
}

impl Default for KelvinRange {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}
