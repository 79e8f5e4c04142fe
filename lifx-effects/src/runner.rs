//! Effect runner
//!
//! Drives one device from a [`ColorSource`] on a background thread. Unlike the
//! state poller, a runner can be stopped and started again any number of
//! times; each start resumes from the last color it applied.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use lifx_device::{Color, Device};
use parking_lot::Mutex;

use crate::error::{EffectError, Result};
use crate::source::ColorSource;

/// Label used in logs when the device cannot tell us its own
const UNKNOWN_LABEL: &str = "<label-err>";

const EFFECT_THREAD_NAME: &str = "lifx-effect";

/// Configuration for an [`EffectRunner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectConfig {
    /// Transition time requested for every color change
    /// Default: 1 second
    pub transition: Duration,

    /// Keep producing colors until stopped; otherwise stop after the first
    /// color that reaches the device
    /// Default: true
    pub continuous: bool,

    /// Pause between frames
    /// Default: 50 milliseconds
    pub frame_interval: Duration,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            transition: Duration::from_secs(1),
            continuous: true,
            frame_interval: Duration::from_millis(50),
        }
    }
}

impl EffectConfig {
    /// Apply a single color and stop
    pub fn one_shot() -> Self {
        Self {
            continuous: false,
            ..Default::default()
        }
    }

    pub fn with_transition(mut self, transition: Duration) -> Self {
        self.transition = transition;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }
}

/// Repeatedly recolors one device from a [`ColorSource`]
pub struct EffectRunner {
    device: Arc<dyn Device>,
    label: String,
    source_name: String,
    source: Arc<Mutex<Box<dyn ColorSource>>>,
    last_color: Arc<Mutex<Color>>,
    config: EffectConfig,
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl EffectRunner {
    /// Create a stopped runner
    ///
    /// `initial` is handed to the source as the "previous" color of the first
    /// frame, normally the color currently shown for the device.
    pub fn new(
        device: Arc<dyn Device>,
        source: impl ColorSource + 'static,
        initial: Color,
        config: EffectConfig,
    ) -> Self {
        let label = device
            .label()
            .map(|l| l.to_string())
            .unwrap_or_else(|_| UNKNOWN_LABEL.to_string());
        let source_name = source.name().to_string();
        tracing::info!(
            "Initialized effect: device {} // source: {} // continuous: {}",
            label,
            source_name,
            config.continuous
        );

        let source: Box<dyn ColorSource> = Box::new(source);
        Self {
            device,
            label,
            source_name,
            source: Arc::new(Mutex::new(source)),
            last_color: Arc::new(Mutex::new(initial)),
            config,
            stop_tx: None,
            handle: None,
        }
    }

    /// Start driving the device
    ///
    /// Fails with [`EffectError::AlreadyRunning`] if the effect thread is
    /// still alive. A one-shot effect that already finished can be started
    /// again.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(EffectError::AlreadyRunning);
        }
        self.reap();

        let (stop_tx, stop_rx) = mpsc::channel();
        let frame = Frame {
            device: Arc::clone(&self.device),
            label: self.label.clone(),
            source_name: self.source_name.clone(),
            source: Arc::clone(&self.source),
            last_color: Arc::clone(&self.last_color),
            config: self.config,
        };

        // Labels are arbitrary strings and may not be valid thread names
        let handle = thread::Builder::new()
            .name(EFFECT_THREAD_NAME.to_string())
            .spawn(move || frame.run(stop_rx))?;

        self.stop_tx = Some(stop_tx);
        self.handle = Some(handle);
        tracing::debug!("Effect thread started for {}", self.label);
        Ok(())
    }

    /// Stop driving the device and wait for the current frame to finish
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        self.reap();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Last color successfully applied, or the initial color
    pub fn last_color(&self) -> Color {
        *self.last_color.lock()
    }

    /// Replace the color the next frame starts from
    pub fn set_last_color(&self, color: Color) {
        *self.last_color.lock() = color;
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    fn reap(&mut self) {
        self.stop_tx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Effect thread for {} panicked", self.label);
            }
        }
    }
}

impl Drop for EffectRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for EffectRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRunner")
            .field("label", &self.label)
            .field("source", &self.source_name)
            .field("running", &self.is_running())
            .field("config", &self.config)
            .finish()
    }
}

/// Everything the effect thread needs
struct Frame {
    device: Arc<dyn Device>,
    label: String,
    source_name: String,
    source: Arc<Mutex<Box<dyn ColorSource>>>,
    last_color: Arc<Mutex<Color>>,
    config: EffectConfig,
}

impl Frame {
    fn run(self, stop_rx: mpsc::Receiver<()>) {
        tracing::debug!("Starting effect {} on {}", self.source_name, self.label);

        loop {
            match self.step() {
                Ok(color) => {
                    tracing::trace!("Applied {} to {}", color, self.label);
                    if !self.config.continuous {
                        break;
                    }
                }
                // Transient; the next frame tries again
                Err(e) => tracing::info!(
                    "Effect frame {} for {} failed: {}",
                    self.source_name,
                    self.label,
                    e
                ),
            }

            match stop_rx.recv_timeout(self.config.frame_interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        tracing::debug!("Effect on {} finished", self.label);
    }

    fn step(&self) -> Result<Color> {
        let previous = *self.last_color.lock();
        let color = {
            let mut source = self.source.lock();
            source.produce(previous)?
        };
        self.device
            .set_color(color, self.config.transition, self.config.continuous)?;
        *self.last_color.lock() = color;
        Ok(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticColor;
    use lifx_device::dummy::{DummyBulb, FailureMode};
    use lifx_device::Power;

    #[test]
    fn test_default_config() {
        let config = EffectConfig::default();
        assert_eq!(config.transition, Duration::from_secs(1));
        assert!(config.continuous);
        assert_eq!(config.frame_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_one_shot_preset() {
        let config = EffectConfig::one_shot().with_transition(Duration::ZERO);
        assert!(!config.continuous);
        assert_eq!(config.transition, Duration::ZERO);
    }

    #[test]
    fn test_new_runner_is_idle() {
        let bulb: Arc<dyn Device> = Arc::new(DummyBulb::new("Idle", Power::ON, Color::default()));
        let runner = EffectRunner::new(bulb, StaticColor(Color::default()), Color::default(), EffectConfig::default());
        assert!(!runner.is_running());
        assert_eq!(runner.label, "Idle");
        assert_eq!(runner.source_name, "static");
    }

    #[test]
    fn test_label_failure_falls_back() {
        let bulb = DummyBulb::new("Hidden", Power::ON, Color::default());
        bulb.set_failures(FailureMode::ALL);
        let runner = EffectRunner::new(
            Arc::new(bulb),
            StaticColor(Color::default()),
            Color::default(),
            EffectConfig::one_shot(),
        );
        assert_eq!(runner.label, UNKNOWN_LABEL);
    }

    #[test]
    fn test_set_last_color() {
        let bulb: Arc<dyn Device> = Arc::new(DummyBulb::new("Seed", Power::ON, Color::default()));
        let runner = EffectRunner::new(bulb, StaticColor(Color::default()), Color::default(), EffectConfig::default());
        let seed = Color::new(1, 2, 3, 4000);
        runner.set_last_color(seed);
        assert_eq!(runner.last_color(), seed);
    }
}
