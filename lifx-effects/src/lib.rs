//! LIFX Effects
//!
//! Continuous recoloring of a device from a pluggable [`ColorSource`]: a
//! picked color, a closure, or the loudness of an audio stream.
//!
//! ```rust,ignore
//! use lifx_effects::{EffectConfig, EffectRunner, LoudnessFollower};
//!
//! let follower = LoudnessFollower::new(microphone);
//! let mut effect = EffectRunner::new(bulb, follower, current_color, EffectConfig::default());
//! effect.start()?;
//! // ...
//! effect.stop();
//! ```

pub mod error;
pub mod loudness;
pub mod runner;
pub mod source;

pub use error::{EffectError, Result};
pub use loudness::{LoudnessConfig, LoudnessFollower, SampleSource};
pub use runner::{EffectConfig, EffectRunner};
pub use source::{from_fn, ColorSource, FnSource, StaticColor};
