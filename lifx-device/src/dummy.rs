//! Scriptable in-memory devices for tests
//!
//! [`DummyBulb`] behaves like a reachable bulb whose state can be changed from
//! the test, made to fail on demand, or slowed down to simulate a congested
//! network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::{Color, Device, DeviceError, DeviceLabel, Power, Result};

/// Which calls a [`DummyBulb`] should fail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureMode {
    pub label: bool,
    pub power: bool,
    pub color: bool,
}

impl FailureMode {
    pub const NONE: FailureMode = FailureMode {
        label: false,
        power: false,
        color: false,
    };

    pub const ALL: FailureMode = FailureMode {
        label: true,
        power: true,
        color: true,
    };
}

#[derive(Debug)]
struct BulbState {
    power: Power,
    color: Color,
    zones: Option<Vec<Color>>,
    failures: FailureMode,
    panic_on_query: bool,
    latency: Duration,
    sent_colors: Vec<(Color, Duration, bool)>,
}

/// In-memory bulb
#[derive(Debug)]
pub struct DummyBulb {
    label: DeviceLabel,
    group: bool,
    state: Mutex<BulbState>,
    power_reads: AtomicUsize,
    color_reads: AtomicUsize,
}

impl DummyBulb {
    pub fn new(label: impl Into<DeviceLabel>, power: Power, color: Color) -> Self {
        Self {
            label: label.into(),
            group: false,
            state: Mutex::new(BulbState {
                power,
                color,
                zones: None,
                failures: FailureMode::NONE,
                panic_on_query: false,
                latency: Duration::ZERO,
                sent_colors: Vec::new(),
            }),
            power_reads: AtomicUsize::new(0),
            color_reads: AtomicUsize::new(0),
        }
    }

    /// A multizone strip whose zones are reported separately from its color
    pub fn multizone(label: impl Into<DeviceLabel>, power: Power, zones: Vec<Color>) -> Self {
        let bulb = Self::new(label, power, zones.first().copied().unwrap_or_default());
        bulb.state.lock().zones = Some(zones);
        bulb
    }

    pub fn group(label: impl Into<DeviceLabel>, power: Power, color: Color) -> Self {
        Self {
            group: true,
            ..Self::new(label, power, color)
        }
    }

    pub fn set_reported_power(&self, power: Power) {
        self.state.lock().power = power;
    }

    pub fn set_reported_color(&self, color: Color) {
        self.state.lock().color = color;
    }

    pub fn set_failures(&self, failures: FailureMode) {
        self.state.lock().failures = failures;
    }

    /// Make every state query panic instead of returning
    pub fn set_panic_on_query(&self, panic: bool) {
        self.state.lock().panic_on_query = panic;
    }

    /// Delay applied to every state query
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    pub fn power_reads(&self) -> usize {
        self.power_reads.load(Ordering::SeqCst)
    }

    pub fn color_reads(&self) -> usize {
        self.color_reads.load(Ordering::SeqCst)
    }

    /// Every `set_color` call received, oldest first
    pub fn sent_colors(&self) -> Vec<(Color, Duration, bool)> {
        self.state.lock().sent_colors.clone()
    }

    fn before_query(&self) -> FailureMode {
        let (latency, failures, panic) = {
            let state = self.state.lock();
            (state.latency, state.failures, state.panic_on_query)
        };
        if panic {
            panic!("{} exploded", self.label);
        }
        if !latency.is_zero() {
            thread::sleep(latency);
        }
        failures
    }

    fn timeout(&self) -> DeviceError {
        DeviceError::Timeout(self.label.to_string())
    }
}

impl Device for DummyBulb {
    fn label(&self) -> Result<DeviceLabel> {
        if self.state.lock().failures.label {
            return Err(self.timeout());
        }
        Ok(self.label.clone())
    }

    fn get_power(&self) -> Result<Power> {
        self.power_reads.fetch_add(1, Ordering::SeqCst);
        if self.before_query().power {
            return Err(self.timeout());
        }
        Ok(self.state.lock().power)
    }

    fn get_color(&self) -> Result<Color> {
        self.color_reads.fetch_add(1, Ordering::SeqCst);
        if self.before_query().color {
            return Err(self.timeout());
        }
        Ok(self.state.lock().color)
    }

    fn get_color_zones(&self) -> Result<Vec<Color>> {
        if self.before_query().color {
            return Err(self.timeout());
        }
        let state = self.state.lock();
        Ok(state.zones.clone().unwrap_or_else(|| vec![state.color]))
    }

    fn supports_multizone(&self) -> bool {
        self.state.lock().zones.is_some()
    }

    fn is_group(&self) -> bool {
        self.group
    }

    fn set_power(&self, power: Power, _duration: Duration) -> Result<()> {
        let mut state = self.state.lock();
        if state.failures.power {
            return Err(DeviceError::Unreachable(self.label.to_string()));
        }
        state.power = power;
        Ok(())
    }

    fn set_color(&self, color: Color, duration: Duration, rapid: bool) -> Result<()> {
        let mut state = self.state.lock();
        if state.failures.color {
            return Err(DeviceError::Unreachable(self.label.to_string()));
        }
        state.color = color;
        state.sent_colors.push((color, duration, rapid));
        Ok(())
    }
}
