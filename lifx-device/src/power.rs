//! Power level type

use serde::{Deserialize, Serialize};
use std::fmt;

/// Power level reported by a bulb
///
/// Bulbs report `0` when off and a nonzero level when on; `65535` is the
/// canonical "on" value. Equality is exact, so `Power(1)` and `Power::ON`
/// are different observations even though both are "on".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Power(pub u16);

impl Power {
    pub const OFF: Power = Power(0);
    pub const ON: Power = Power(u16::MAX);

    /// Raw level as reported by the device
    pub fn level(self) -> u16 {
        self.0
    }

    pub fn is_on(self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for Power {
    fn from(on: bool) -> Self {
        if on {
            Power::ON
        } else {
            Power::OFF
        }
    }
}

impl From<u16> for Power {
    fn from(level: u16) -> Self {
        Power(level)
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_on() {
            write!(f, "on ({})", self.0)
        } else {
            f.write_str("off")
        }
    }
}
