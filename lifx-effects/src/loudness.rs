//! Music-following brightness
//!
//! Maps the loudness of the incoming audio to bulb brightness. Each frame the
//! RMS of one chunk of 16-bit samples is scaled, curved by an exponent and
//! smoothed over a sliding window. Hue, saturation and kelvin are carried over
//! from the previous color.

use std::collections::VecDeque;

use lifx_device::Color;

use crate::error::Result;
use crate::source::ColorSource;

/// Supplier of signed 16-bit audio samples
///
/// Implementations typically block until one chunk is available.
pub trait SampleSource: Send {
    fn read_chunk(&mut self) -> Result<Vec<i16>>;
}

/// Tuning for [`LoudnessFollower`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessConfig {
    /// Raise if the bulb is too dim, lower if too bright
    pub scale: f64,
    /// Higher values widen the gap between quiet and loud passages
    pub exponent: i32,
    /// Length of the smoothing window in chunks
    pub window: usize,
}

impl Default for LoudnessConfig {
    fn default() -> Self {
        Self {
            scale: 8.0,
            exponent: 2,
            window: 15,
        }
    }
}

/// Root mean square of a chunk, truncated like the usual audio helpers
pub fn rms(samples: &[i16]) -> u32 {
    if samples.is_empty() {
        return 0;
    }
    let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum / samples.len() as f64).sqrt() as u32
}

/// Brightness level in `0..=65535` for one chunk's RMS
pub fn level_for_rms(rms: u32, config: &LoudnessConfig) -> u16 {
    let level = (f64::from(rms) / 65536.0 * config.scale).min(1.0);
    (level.powi(config.exponent) * 65535.0) as u16
}

/// [`ColorSource`] that follows audio loudness
pub struct LoudnessFollower<S> {
    samples: S,
    config: LoudnessConfig,
    window: VecDeque<u16>,
}

impl<S: SampleSource> LoudnessFollower<S> {
    pub fn new(samples: S) -> Self {
        Self::with_config(samples, LoudnessConfig::default())
    }

    pub fn with_config(samples: S, config: LoudnessConfig) -> Self {
        let len = config.window.max(1);
        Self {
            samples,
            config,
            window: VecDeque::from(vec![0; len]),
        }
    }

    /// Push one level into the window and return the smoothed brightness
    fn smooth(&mut self, level: u16) -> u16 {
        self.window.pop_back();
        self.window.push_front(level);
        let sum: u64 = self.window.iter().map(|&l| u64::from(l)).sum();
        let len = self.window.len() as u64;
        // Never exceeds u16::MAX since every element is at most that
        u16::try_from(sum.div_ceil(len)).unwrap_or(u16::MAX)
    }
}

impl<S: SampleSource> ColorSource for LoudnessFollower<S> {
    fn name(&self) -> &str {
        "loudness"
    }

    fn produce(&mut self, previous: Color) -> Result<Color> {
        let chunk = self.samples.read_chunk()?;
        let level = level_for_rms(rms(&chunk), &self.config);
        Ok(previous.with_brightness(self.smooth(level)))
    }
}
