//! Configuration for the polling worker
//!
//! Controls the heartbeat of the background poller, how many device queries
//! may run at once, and the drain cadence recommended to UI consumers.

use std::time::Duration;

use crate::error::{Result, StateError};

/// Environment variable overriding [`PollerConfig::heartbeat`] (milliseconds)
pub const HEARTBEAT_ENV: &str = "LIFX_HEARTBEAT_MS";

/// Environment variable overriding [`PollerConfig::drain_interval`] (milliseconds)
pub const DRAIN_INTERVAL_ENV: &str = "LIFX_DRAIN_INTERVAL_MS";

/// Configuration for the PollingWorker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Time between the end of one tick and the start of the next
    /// Default: 3 seconds
    pub heartbeat: Duration,

    /// How often a consumer should drain the change queues
    ///
    /// Advisory only; the worker never reads it.
    /// Default: 1.5 seconds
    pub drain_interval: Duration,

    /// Upper bound on device queries in flight during one tick
    /// Default: 64
    pub max_concurrent_queries: usize,

    /// Name given to the heartbeat thread
    /// Default: "lifx-poller"
    pub thread_name: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_millis(3000),
            drain_interval: Duration::from_millis(1500),
            max_concurrent_queries: 64,
            thread_name: "lifx-poller".to_string(),
        }
    }
}

impl PollerConfig {
    /// Create a new PollerConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a PollerConfig for snappy UIs on a quiet network
    pub fn fast_polling() -> Self {
        Self {
            heartbeat: Duration::from_millis(500),
            drain_interval: Duration::from_millis(250),
            ..Default::default()
        }
    }

    /// Defaults overridden by `LIFX_HEARTBEAT_MS` and `LIFX_DRAIN_INTERVAL_MS`
    ///
    /// Unparseable values are rejected rather than ignored.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(ms) = read_millis(HEARTBEAT_ENV)? {
            config.heartbeat = ms;
        }
        if let Some(ms) = read_millis(DRAIN_INTERVAL_ENV)? {
            config.drain_interval = ms;
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat.is_zero() {
            return Err(StateError::Configuration(
                "Heartbeat must be greater than 0".to_string(),
            ));
        }

        if self.drain_interval.is_zero() {
            return Err(StateError::Configuration(
                "Drain interval must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrent_queries == 0 {
            return Err(StateError::Configuration(
                "Max concurrent queries must be greater than 0".to_string(),
            ));
        }

        if self.thread_name.contains('\0') {
            return Err(StateError::Configuration(
                "Thread name must not contain NUL bytes".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    pub fn with_drain_interval(mut self, interval: Duration) -> Self {
        self.drain_interval = interval;
        self
    }

    pub fn with_max_concurrent_queries(mut self, max: usize) -> Self {
        self.max_concurrent_queries = max;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

fn read_millis(var: &str) -> Result<Option<Duration>> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| StateError::Configuration(format!("{var} is not a number: {raw:?}"))),
        Err(_) => Ok(None),
    }
}
