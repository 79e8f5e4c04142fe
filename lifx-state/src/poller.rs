//! Background polling of device state
//!
//! A [`PollingWorker`] owns one heartbeat thread. Every heartbeat it runs a
//! tick: registered devices are queried in parallel by a pool of scoped
//! workers, and any power or color that differs from the registry cache is
//! queued for the UI.
//!
//! Device failures never stop the worker. A device whose power read fails is
//! skipped for that tick; a device whose color read fails keeps the power
//! change already recorded in the same tick. Only [`PollingWorker::stop`] (or
//! dropping the worker) ends the loop, and the tick in flight always runs to
//! completion first.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use lifx_device::DeviceLabel;

use crate::config::PollerConfig;
use crate::error::{Result, StateError};
use crate::registry::{DeviceRegistry, PolledDevice};

/// Lifecycle of a [`PollingWorker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, not yet started
    Idle,
    /// Heartbeat thread is alive
    Running,
    /// Terminal; construct a new worker to poll again
    Stopped,
}

/// Commands sent from the owning handle to the heartbeat thread
#[derive(Debug)]
enum Command {
    Shutdown,
}

/// Result of querying one device during a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOutcome {
    pub power_changed: bool,
    pub color_changed: bool,
    /// A device call failed and the rest of this device's tick was skipped
    pub failed: bool,
}

/// Summary of one polling pass over every registered device
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub queried: usize,
    pub power_changes: Vec<DeviceLabel>,
    pub color_changes: Vec<DeviceLabel>,
    pub failed: Vec<DeviceLabel>,
    pub elapsed: Duration,
}

impl TickReport {
    pub fn change_count(&self) -> usize {
        self.power_changes.len() + self.color_changes.len()
    }

    fn record(&mut self, label: &DeviceLabel, outcome: QueryOutcome) {
        self.queried += 1;
        if outcome.power_changed {
            self.power_changes.push(label.clone());
        }
        if outcome.color_changed {
            self.color_changes.push(label.clone());
        }
        if outcome.failed {
            self.failed.push(label.clone());
        }
    }
}

/// Query one device and record any change in the registry
///
/// Power is read and compared before color. The first failing call ends the
/// query for this tick.
pub fn query_device(registry: &DeviceRegistry, polled: &PolledDevice) -> QueryOutcome {
    let label = polled.label.as_str();
    let mut outcome = QueryOutcome::default();

    let power = match polled.device.get_power() {
        Ok(power) => power,
        Err(e) => {
            tracing::warn!("Failed to read power of {}: {}", label, e);
            outcome.failed = true;
            return outcome;
        }
    };
    match registry.observe_power(label, power) {
        Ok(changed) => outcome.power_changed = changed,
        Err(e) => {
            tracing::warn!("Polled device {} has no registry entry: {}", label, e);
            outcome.failed = true;
            return outcome;
        }
    }
    if outcome.power_changed {
        tracing::debug!("Power of {} changed to {}", label, power);
    }

    let color = match polled.device.get_color() {
        Ok(color) => color,
        Err(e) => {
            tracing::warn!("Failed to read color of {}: {}", label, e);
            outcome.failed = true;
            return outcome;
        }
    };
    match registry.observe_color(label, color) {
        Ok(changed) => outcome.color_changed = changed,
        Err(e) => {
            tracing::warn!("Polled device {} has no registry entry: {}", label, e);
            outcome.failed = true;
            return outcome;
        }
    }
    if outcome.color_changed {
        tracing::debug!("Color of {} changed to {}", label, color);
    }

    outcome
}

/// Run one tick: query every registered device concurrently
///
/// Up to `max_concurrent_queries` scoped workers pull devices off a shared
/// cursor until every device has been queried, so a slow device only ever
/// occupies its own worker. Returns once every query of the tick has
/// finished. A device implementation that panics is contained and reported
/// as failed.
pub fn poll_tick(registry: &DeviceRegistry, max_concurrent_queries: usize) -> TickReport {
    let started = Instant::now();
    let devices = registry.devices();
    let workers = max_concurrent_queries.max(1).min(devices.len());
    let cursor = AtomicUsize::new(0);
    let mut outcomes: Vec<Option<QueryOutcome>> = vec![None; devices.len()];

    thread::scope(|scope| {
        let pull = || run_queries(registry, &devices, &cursor);
        let mut handles = Vec::with_capacity(workers);
        let mut spawn_failed = false;

        for index in 0..workers {
            // Labels are arbitrary strings and may not be valid thread names
            match thread::Builder::new()
                .name(format!("lifx-query-{index}"))
                .spawn_scoped(scope, pull)
            {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    tracing::warn!("Could not spawn query worker {}: {}", index, e);
                    spawn_failed = true;
                    break;
                }
            }
        }

        // Whatever the spawned workers have not claimed yet runs here
        if spawn_failed {
            for (index, outcome) in pull() {
                outcomes[index] = Some(outcome);
            }
        }

        for handle in handles {
            match handle.join() {
                Ok(done) => {
                    for (index, outcome) in done {
                        outcomes[index] = Some(outcome);
                    }
                }
                Err(_) => tracing::error!("Query worker panicked"),
            }
        }
    });

    let mut report = TickReport::default();
    for (polled, outcome) in devices.iter().zip(outcomes) {
        let outcome = outcome.unwrap_or_else(failed_outcome);
        tracing::trace!("Queried {}: {:?}", polled.label, outcome);
        report.record(&polled.label, outcome);
    }
    report.elapsed = started.elapsed();
    report
}

/// Query devices off the shared cursor until none are left
fn run_queries(
    registry: &DeviceRegistry,
    devices: &[PolledDevice],
    cursor: &AtomicUsize,
) -> Vec<(usize, QueryOutcome)> {
    let mut done = Vec::new();
    loop {
        let index = cursor.fetch_add(1, Ordering::Relaxed);
        let Some(polled) = devices.get(index) else {
            break;
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| query_device(registry, polled)))
            .unwrap_or_else(|_| {
                tracing::warn!("Query of {} panicked", polled.label);
                failed_outcome()
            });
        done.push((index, outcome));
    }
    done
}

fn failed_outcome() -> QueryOutcome {
    QueryOutcome {
        failed: true,
        ..QueryOutcome::default()
    }
}

#[derive(Debug, Default)]
struct StatsCounters {
    ticks: AtomicU64,
    queries: AtomicU64,
    failed_queries: AtomicU64,
    power_changes: AtomicU64,
    color_changes: AtomicU64,
    last_tick_micros: AtomicU64,
}

impl StatsCounters {
    fn record(&self, report: &TickReport) {
        self.queries.fetch_add(report.queried as u64, Ordering::Relaxed);
        self.failed_queries
            .fetch_add(report.failed.len() as u64, Ordering::Relaxed);
        self.power_changes
            .fetch_add(report.power_changes.len() as u64, Ordering::Relaxed);
        self.color_changes
            .fetch_add(report.color_changes.len() as u64, Ordering::Relaxed);
        self.last_tick_micros.store(
            u64::try_from(report.elapsed.as_micros()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
        // Last, so a reader that sees the tick also sees its counters
        self.ticks.fetch_add(1, Ordering::Release);
    }

    fn snapshot(&self) -> PollingStats {
        let ticks = self.ticks.load(Ordering::Acquire);
        PollingStats {
            ticks,
            queries: self.queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            power_changes: self.power_changes.load(Ordering::Relaxed),
            color_changes: self.color_changes.load(Ordering::Relaxed),
            last_tick: Duration::from_micros(self.last_tick_micros.load(Ordering::Relaxed)),
        }
    }
}

/// Statistics for a polling worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollingStats {
    pub ticks: u64,
    pub queries: u64,
    pub failed_queries: u64,
    pub power_changes: u64,
    pub color_changes: u64,
    pub last_tick: Duration,
}

impl std::fmt::Display for PollingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Polling Stats:")?;
        writeln!(f, "  Ticks: {}", self.ticks)?;
        writeln!(
            f,
            "  Queries: {} ({} failed)",
            self.queries, self.failed_queries
        )?;
        writeln!(
            f,
            "  Changes: {} power, {} color",
            self.power_changes, self.color_changes
        )?;
        write!(f, "  Last tick: {:?}", self.last_tick)
    }
}

/// Background poller feeding observed device state into a [`DeviceRegistry`]
pub struct PollingWorker {
    registry: DeviceRegistry,
    config: PollerConfig,
    state: WorkerState,
    command_tx: Option<mpsc::Sender<Command>>,
    handle: Option<JoinHandle<()>>,
    stats: Arc<StatsCounters>,
}

impl PollingWorker {
    /// Create an idle worker; the configuration is validated here
    pub fn new(registry: DeviceRegistry, config: PollerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            config,
            state: WorkerState::Idle,
            command_tx: None,
            handle: None,
            stats: Arc::new(StatsCounters::default()),
        })
    }

    /// Spawn the heartbeat thread
    ///
    /// Fails with [`StateError::AlreadyRunning`] when running and
    /// [`StateError::WorkerStopped`] once stopped.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            WorkerState::Running => return Err(StateError::AlreadyRunning),
            WorkerState::Stopped => return Err(StateError::WorkerStopped),
            WorkerState::Idle => {}
        }

        let (command_tx, command_rx) = mpsc::channel();
        let registry = self.registry.clone();
        let config = self.config.clone();
        let stats = Arc::clone(&self.stats);

        let handle = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || run_heartbeat_loop(registry, config, command_rx, stats))?;

        self.command_tx = Some(command_tx);
        self.handle = Some(handle);
        self.state = WorkerState::Running;
        Ok(())
    }

    /// Stop polling
    ///
    /// Blocks until the tick in flight, if any, has finished. No tick starts
    /// after this returns. Stopping an idle worker moves it straight to
    /// [`WorkerState::Stopped`]; stopping twice is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.command_tx.take() {
            // Err only means the loop already exited
            let _ = tx.send(Command::Shutdown);
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Polling thread panicked");
            }
        }
        if self.state != WorkerState::Stopped {
            tracing::info!("Polling worker stopped");
        }
        self.state = WorkerState::Stopped;
        Ok(())
    }

    pub fn state(&self) -> WorkerState {
        match (&self.state, &self.handle) {
            (WorkerState::Running, Some(handle)) if handle.is_finished() => WorkerState::Stopped,
            (state, _) => *state,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == WorkerState::Running
    }

    pub fn stats(&self) -> PollingStats {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for PollingWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingWorker")
            .field("state", &self.state())
            .field("heartbeat", &self.config.heartbeat)
            .field("devices", &self.registry.len())
            .finish()
    }
}

/// Main heartbeat loop
///
/// Waits up to one heartbeat for a command, then ticks. A closed command
/// channel means the owning worker was dropped.
fn run_heartbeat_loop(
    registry: DeviceRegistry,
    config: PollerConfig,
    command_rx: mpsc::Receiver<Command>,
    stats: Arc<StatsCounters>,
) {
    tracing::info!(
        "Polling worker started (heartbeat: {:?}, devices: {})",
        config.heartbeat,
        registry.len()
    );

    loop {
        match command_rx.recv_timeout(config.heartbeat) {
            Ok(Command::Shutdown) => {
                tracing::debug!("Polling worker received shutdown command");
                break;
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("Polling worker handle dropped, shutting down");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                let report = poll_tick(&registry, config.max_concurrent_queries);
                tracing::debug!(
                    "Tick finished in {:?}: {} queried, {} changes, {} failed",
                    report.elapsed,
                    report.queried,
                    report.change_count(),
                    report.failed.len()
                );
                stats.record(&report);
            }
        }
    }

    tracing::info!("Polling worker loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifx_device::dummy::{DummyBulb, FailureMode};
    use lifx_device::{Color, Device, Power};

    fn registry_with(bulbs: &[Arc<DummyBulb>]) -> DeviceRegistry {
        let registry = DeviceRegistry::new();
        registry.register(bulbs.iter().map(|b| Arc::clone(b) as Arc<dyn Device>));
        registry
    }

    #[test]
    fn test_worker_state_machine() {
        let mut worker = PollingWorker::new(
            DeviceRegistry::new(),
            PollerConfig::new().with_heartbeat(Duration::from_millis(20)),
        )
        .unwrap();
        assert_eq!(worker.state(), WorkerState::Idle);

        worker.start().unwrap();
        assert!(worker.is_running());
        assert!(matches!(worker.start(), Err(StateError::AlreadyRunning)));

        worker.stop().unwrap();
        assert_eq!(worker.state(), WorkerState::Stopped);
        assert!(matches!(worker.start(), Err(StateError::WorkerStopped)));

        // Second stop is a no-op
        worker.stop().unwrap();
    }

    #[test]
    fn test_stop_from_idle_is_terminal() {
        let mut worker = PollingWorker::new(DeviceRegistry::new(), PollerConfig::new()).unwrap();
        worker.stop().unwrap();
        assert_eq!(worker.state(), WorkerState::Stopped);
        assert!(matches!(worker.start(), Err(StateError::WorkerStopped)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PollerConfig::new().with_heartbeat(Duration::ZERO);
        assert!(matches!(
            PollingWorker::new(DeviceRegistry::new(), config),
            Err(StateError::Configuration(_))
        ));
    }

    #[test]
    fn test_query_device_stops_at_power_failure() {
        let bulb = Arc::new(DummyBulb::new("A", Power::OFF, Color::default()));
        let registry = registry_with(&[Arc::clone(&bulb)]);
        bulb.set_failures(FailureMode {
            power: true,
            ..FailureMode::NONE
        });
        let reads_before = bulb.color_reads();

        let outcome = query_device(&registry, &registry.devices()[0]);

        assert!(outcome.failed);
        assert_eq!(bulb.color_reads(), reads_before);
    }

    #[test]
    fn test_query_device_keeps_power_change_when_color_fails() {
        let bulb = Arc::new(DummyBulb::new("A", Power::OFF, Color::default()));
        let registry = registry_with(&[Arc::clone(&bulb)]);
        bulb.set_reported_power(Power::ON);
        bulb.set_failures(FailureMode {
            color: true,
            ..FailureMode::NONE
        });

        let outcome = query_device(&registry, &registry.devices()[0]);

        assert!(outcome.failed);
        assert!(outcome.power_changed);
        assert!(!outcome.color_changed);
        assert_eq!(registry.drain_power_queue("A").unwrap(), Some(Power::ON));
    }

    #[test]
    fn test_poll_tick_respects_concurrency_cap() {
        let bulbs: Vec<_> = (0..5)
            .map(|i| Arc::new(DummyBulb::new(format!("bulb-{i}"), Power::OFF, Color::default())))
            .collect();
        let registry = registry_with(&bulbs);
        for bulb in &bulbs {
            bulb.set_reported_power(Power::ON);
        }

        let report = poll_tick(&registry, 2);

        assert_eq!(report.queried, 5);
        assert_eq!(report.power_changes.len(), 5);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_slow_device_does_not_hold_back_the_rest() {
        let slow = Arc::new(DummyBulb::new("slow", Power::OFF, Color::default()));
        let fast = Arc::new(DummyBulb::new("fast", Power::OFF, Color::default()));
        let third = Arc::new(DummyBulb::new("third", Power::OFF, Color::default()));
        let registry = registry_with(&[Arc::clone(&slow), Arc::clone(&fast), Arc::clone(&third)]);
        slow.set_latency(Duration::from_millis(300));

        let ticking = registry.clone();
        let tick = thread::spawn(move || poll_tick(&ticking, 2));

        thread::sleep(Duration::from_millis(150));
        // slow is still inside its power read, third was picked up by the free worker
        assert_eq!(slow.color_reads(), 1);
        assert_eq!(third.power_reads(), 2);
        assert_eq!(third.color_reads(), 2);

        let report = tick.join().unwrap();
        assert_eq!(report.queried, 3);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_panicking_device_does_not_skip_later_devices() {
        let bad = Arc::new(DummyBulb::new("bad", Power::OFF, Color::default()));
        let good = Arc::new(DummyBulb::new("good", Power::OFF, Color::default()));
        let registry = registry_with(&[Arc::clone(&bad), Arc::clone(&good)]);
        bad.set_panic_on_query(true);
        good.set_reported_power(Power::ON);

        // One worker handles both devices in order
        let report = poll_tick(&registry, 1);

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].as_str(), "bad");
        assert_eq!(registry.drain_power_queue("good").unwrap(), Some(Power::ON));
    }

    #[test]
    fn test_stats_display() {
        let stats = PollingStats {
            ticks: 3,
            queries: 6,
            failed_queries: 1,
            power_changes: 2,
            color_changes: 0,
            last_tick: Duration::from_millis(12),
        };
        let text = stats.to_string();
        assert!(text.contains("Ticks: 3"));
        assert!(text.contains("6 (1 failed)"));
    }
}
