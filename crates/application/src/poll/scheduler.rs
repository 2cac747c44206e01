use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::{BusTransport, GatewaySnapshot, SnapshotObserver};
use infrastructure::drivers::DeviceDriver;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::state::{SnapshotPersister, StateStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    Idle,
    Polling,
    Committing,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchedulerStats {
    pub cycles: u64,
    /// Ticks that fell due while a cycle was still running
    pub skipped_ticks: u64,
    pub persistence_failures: u64,
    pub observer_failures: u64,
    pub last_cycle_ms: u64,
    pub last_commit_at: Option<DateTime<Utc>>,
}

/// Read-only view of a running scheduler, for the serving layer
#[derive(Clone)]
pub struct SchedulerHandle {
    phase: watch::Receiver<SchedulerPhase>,
    stats: Arc<Mutex<SchedulerStats>>,
}

impl SchedulerHandle {
    pub fn phase(&self) -> SchedulerPhase {
        *self.phase.borrow()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerPhase> {
        self.phase.clone()
    }
}

/// Drives the acquisition loop.
///
/// Each cycle polls every driver in order over the shared bus, commits all
/// outcomes to the state store at once, persists the committed snapshot and
/// then hands it to the observers. Cycles never overlap.
pub struct PollScheduler {
    drivers: Vec<DeviceDriver>,
    bus: Arc<dyn BusTransport>,
    store: Arc<StateStore>,
    persister: Arc<SnapshotPersister>,
    observers: Vec<Arc<dyn SnapshotObserver>>,
    period: Duration,
    phase: watch::Sender<SchedulerPhase>,
    stats: Arc<Mutex<SchedulerStats>>,
}

impl PollScheduler {
    pub fn new(
        drivers: Vec<DeviceDriver>,
        bus: Arc<dyn BusTransport>,
        persister: Arc<SnapshotPersister>,
        period: Duration,
    ) -> Self {
        let (phase, _) = watch::channel(SchedulerPhase::Idle);
        Self {
            drivers,
            bus,
            store: persister.store().clone(),
            persister,
            observers: Vec::new(),
            period,
            phase,
            stats: Arc::new(Mutex::new(SchedulerStats::default())),
        }
    }

    /// Observers run in registration order after every commit
    pub fn with_observer(mut self, observer: Arc<dyn SnapshotObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            phase: self.phase.subscribe(),
            stats: self.stats.clone(),
        }
    }

    fn update_stats(&self, f: impl FnOnce(&mut SchedulerStats)) {
        f(&mut self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Run one full cycle and return the committed snapshot
    pub async fn run_cycle(&self) -> GatewaySnapshot {
        let started = Instant::now();
        self.phase.send_replace(SchedulerPhase::Polling);

        let mut readings = HashMap::new();
        let mut errors = HashMap::new();
        for driver in &self.drivers {
            match driver.poll(self.bus.as_ref()).await {
                Ok(reading) => {
                    readings.insert(driver.kind(), reading);
                }
                Err(e) if e.is_device_fault() => {
                    warn!(device = %driver.kind(), address = driver.address(), error = %e, "Poll failed");
                    errors.insert(driver.kind(), e);
                }
                Err(e) => {
                    error!(device = %driver.kind(), address = driver.address(), error = %e, "Poll failed unexpectedly");
                    errors.insert(driver.kind(), e);
                }
            }
        }

        self.phase.send_replace(SchedulerPhase::Committing);
        let failed = errors.len();
        let snapshot = self.store.apply_readings(readings, errors);

        if self.persister.flush().await.is_err() {
            self.update_stats(|s| s.persistence_failures += 1);
        }

        for observer in &self.observers {
            if let Err(e) = observer.on_commit(&snapshot).await {
                warn!(observer = observer.name(), cycle = snapshot.cycle, error = %e, "Observer failed");
                self.update_stats(|s| s.observer_failures += 1);
            }
        }

        self.phase.send_replace(SchedulerPhase::Idle);
        let elapsed = started.elapsed();
        self.update_stats(|s| {
            s.cycles += 1;
            s.last_cycle_ms = elapsed.as_millis() as u64;
            s.last_commit_at = Some(snapshot.taken_at);
        });
        debug!(
            cycle = snapshot.cycle,
            devices = self.drivers.len(),
            failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "Poll cycle complete"
        );

        snapshot
    }

    /// Poll at a fixed period until cancelled.
    ///
    /// Cancellation is only observed between cycles; a cycle that has
    /// started always commits.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            period_secs = self.period.as_secs_f64(),
            devices = self.drivers.len(),
            "🔄 Poll scheduler started"
        );

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Shutdown signal received, poll scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let started = Instant::now();
                    self.run_cycle().await;

                    let skipped = skipped_ticks(started.elapsed(), self.period);
                    if skipped > 0 {
                        warn!(skipped, period_secs = self.period.as_secs_f64(), "Poll cycle overran its period, skipping ticks");
                        self.update_stats(|s| s.skipped_ticks += skipped);
                    }
                }
            }
        }
    }
}

/// Ticks that fell due strictly before a cycle of length `elapsed` ended.
///
/// A tick due at the very instant the cycle ends still fires, so it is not
/// counted.
fn skipped_ticks(elapsed: Duration, period: Duration) -> u64 {
    if period.is_zero() {
        return 0;
    }
    (elapsed.as_nanos().saturating_sub(1) / period.as_nanos()) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_ticks() {
        let period = Duration::from_secs(10);
        assert_eq!(skipped_ticks(Duration::from_secs(3), period), 0);
        assert_eq!(skipped_ticks(Duration::from_secs(25), period), 2);
        assert_eq!(skipped_ticks(Duration::ZERO, period), 0);
    }

    #[test]
    fn test_cycle_ending_on_a_tick_boundary_skips_nothing_extra() {
        let period = Duration::from_secs(10);
        assert_eq!(skipped_ticks(Duration::from_secs(10), period), 0);
        assert_eq!(skipped_ticks(Duration::from_secs(20), period), 1);
        assert_eq!(
            skipped_ticks(Duration::from_secs(10) + Duration::from_nanos(1), period),
            1
        );
        assert_eq!(skipped_ticks(Duration::from_secs(25), Duration::ZERO), 0);
    }
}
