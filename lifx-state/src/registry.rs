//! Thread-safe device registry with per-device change queues
//!
//! The registry is the only state shared between the polling worker and the
//! UI consumer. Each registered label owns one cache entry behind its own
//! mutex, so "compare with cache, then enqueue" is atomic with respect to a
//! concurrent drain of the same device while other devices proceed in
//! parallel.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use lifx_device::{representative_color, Color, Device, DeviceError, DeviceLabel, Power};
use parking_lot::{Mutex, RwLock};

use crate::error::{Result, StateError};

/// Cached state and pending changes for one device
#[derive(Debug, Clone)]
pub(crate) struct DeviceEntry {
    power: Power,
    color: Color,
    power_queue: VecDeque<Power>,
    color_queue: VecDeque<Color>,
}

impl DeviceEntry {
    fn seeded(power: Power, color: Color) -> Self {
        Self {
            power,
            color,
            power_queue: VecDeque::new(),
            color_queue: VecDeque::new(),
        }
    }

    fn push_power(&mut self, power: Power) {
        self.power_queue.push_back(power);
        self.power = power;
    }

    fn push_color(&mut self, color: Color) {
        self.color_queue.push_back(color);
        self.color = color;
    }
}

/// Point-in-time copy of one registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub label: DeviceLabel,
    pub power: Power,
    pub color: Color,
    pub pending_power: usize,
    pub pending_color: usize,
}

/// A device in the polling set, paired with the label it was registered under
#[derive(Clone)]
pub struct PolledDevice {
    pub label: DeviceLabel,
    pub device: Arc<dyn Device>,
}

impl std::fmt::Debug for PolledDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolledDevice")
            .field("label", &self.label)
            .field("group", &self.device.is_group())
            .finish()
    }
}

/// Registry of known devices, their cached state and pending changes
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone, Default)]
pub struct DeviceRegistry {
    entries: Arc<RwLock<HashMap<DeviceLabel, Arc<Mutex<DeviceEntry>>>>>,
    devices: Arc<RwLock<Vec<PolledDevice>>>,
}

impl DeviceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register devices for polling
    ///
    /// Each device's label, power and color are read once to seed its entry.
    /// A device that fails any of those reads is logged and skipped; it does
    /// not become pollable until it is registered again successfully. Returns
    /// the labels registered by this call, in input order.
    ///
    /// Registering a label that is already known reseeds its cache and swaps
    /// the polled handle, but keeps any changes still waiting to be drained.
    pub fn register<I>(&self, devices: I) -> Vec<DeviceLabel>
    where
        I: IntoIterator<Item = Arc<dyn Device>>,
    {
        let mut registered = Vec::new();

        for device in devices {
            let (label, power, color) = match read_initial_state(device.as_ref()) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!("Error when communicating with device during registration: {}", e);
                    continue;
                }
            };

            self.insert(label.clone(), power, color, device);
            tracing::debug!("Registered {} (power {}, color {})", label, power, color);
            registered.push(label);
        }

        registered
    }

    fn insert(&self, label: DeviceLabel, power: Power, color: Color, device: Arc<dyn Device>) {
        self.entries
            .write()
            .entry(label.clone())
            .and_modify(|existing| {
                let mut entry = existing.lock();
                entry.power = power;
                entry.color = color;
            })
            .or_insert_with(|| Arc::new(Mutex::new(DeviceEntry::seeded(power, color))));

        let mut devices = self.devices.write();
        let polled = PolledDevice { label, device };
        match devices.iter_mut().find(|d| d.label == polled.label) {
            Some(slot) => *slot = polled,
            None => devices.push(polled),
        }
    }

    fn entry(&self, label: &str) -> Result<Arc<Mutex<DeviceEntry>>> {
        self.entries
            .read()
            .get(label)
            .cloned()
            .ok_or_else(|| StateError::UnknownDevice(label.to_string()))
    }

    // ==================== Cache reads ====================

    /// Last observed power for a device
    pub fn cached_power(&self, label: &str) -> Result<Power> {
        Ok(self.entry(label)?.lock().power)
    }

    /// Last observed color for a device
    pub fn cached_color(&self, label: &str) -> Result<Color> {
        Ok(self.entry(label)?.lock().color)
    }

    // ==================== Producer side ====================

    /// Queue a power change and make it the cached value
    pub fn enqueue_power_change(&self, label: &str, power: Power) -> Result<()> {
        self.entry(label)?.lock().push_power(power);
        Ok(())
    }

    /// Queue a color change and make it the cached value
    pub fn enqueue_color_change(&self, label: &str, color: Color) -> Result<()> {
        self.entry(label)?.lock().push_color(color);
        Ok(())
    }

    /// Record an observed power level, queueing it only if it differs from the cache
    ///
    /// Returns whether a change was queued.
    pub fn observe_power(&self, label: &str, power: Power) -> Result<bool> {
        let entry = self.entry(label)?;
        let mut entry = entry.lock();
        if entry.power == power {
            return Ok(false);
        }
        entry.push_power(power);
        Ok(true)
    }

    /// Record an observed color, queueing it only if it differs from the cache
    ///
    /// Returns whether a change was queued.
    pub fn observe_color(&self, label: &str, color: Color) -> Result<bool> {
        let entry = self.entry(label)?;
        let mut entry = entry.lock();
        if entry.color == color {
            return Ok(false);
        }
        entry.push_color(color);
        Ok(true)
    }

    // ==================== Consumer side ====================

    /// Pop the oldest pending power change, if any
    pub fn drain_power_queue(&self, label: &str) -> Result<Option<Power>> {
        Ok(self.entry(label)?.lock().power_queue.pop_front())
    }

    /// Pop the oldest pending color change, if any
    pub fn drain_color_queue(&self, label: &str) -> Result<Option<Color>> {
        Ok(self.entry(label)?.lock().color_queue.pop_front())
    }

    pub fn pending_power_changes(&self, label: &str) -> Result<usize> {
        Ok(self.entry(label)?.lock().power_queue.len())
    }

    pub fn pending_color_changes(&self, label: &str) -> Result<usize> {
        Ok(self.entry(label)?.lock().color_queue.len())
    }

    /// Copy of one device's cache and queue depths
    pub fn snapshot(&self, label: &str) -> Result<DeviceSnapshot> {
        let entry = self.entry(label)?;
        let entry = entry.lock();
        Ok(DeviceSnapshot {
            label: DeviceLabel::new(label),
            power: entry.power,
            color: entry.color,
            pending_power: entry.power_queue.len(),
            pending_color: entry.color_queue.len(),
        })
    }

    // ==================== Query methods ====================

    /// Devices currently in the polling set, in registration order
    pub fn devices(&self) -> Vec<PolledDevice> {
        self.devices.read().clone()
    }

    /// Labels currently in the polling set, in registration order
    pub fn labels(&self) -> Vec<DeviceLabel> {
        self.devices.read().iter().map(|d| d.label.clone()).collect()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.read().contains_key(label)
    }

    /// Get total number of registered devices
    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.labels())
            .finish()
    }
}

fn read_initial_state(
    device: &dyn Device,
) -> std::result::Result<(DeviceLabel, Power, Color), DeviceError> {
    let label = device.label()?;
    let power = device.get_power()?;
    let color = representative_color(device)?;
    Ok((label, power, color))
}
