use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use domain::{
    Alarm, AlarmLevel, AlarmPublisher, AlarmThresholds, GatewaySnapshot, SnapshotObserver,
};
use tracing::{error, info, warn};

/// Most recent alarms kept for `history`
pub const HISTORY_LIMIT: usize = 100;

#[derive(Default)]
struct AlarmLog {
    active: Vec<Alarm>,
    history: VecDeque<Alarm>,
}

/// Checks every committed snapshot against the alarm thresholds.
///
/// The active list holds at most one alarm per (sensor, level) and stays
/// until cleared; every raised alarm is appended to a bounded history and
/// handed to the publishers.
pub struct AlarmMonitor {
    thresholds: AlarmThresholds,
    log: Mutex<AlarmLog>,
    publishers: Vec<Arc<dyn AlarmPublisher>>,
}

impl AlarmMonitor {
    pub fn new(thresholds: AlarmThresholds) -> Self {
        Self {
            thresholds,
            log: Mutex::new(AlarmLog::default()),
            publishers: Vec::new(),
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn AlarmPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    /// Evaluate a snapshot and return the alarms it raised
    pub fn evaluate(&self, snapshot: &GatewaySnapshot) -> Vec<Alarm> {
        let raised = self.thresholds.evaluate(snapshot);
        if raised.is_empty() {
            return raised;
        }

        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        for alarm in &raised {
            match alarm.level {
                AlarmLevel::Critical => error!(sensor = %alarm.sensor, value = alarm.value, "🚨 {}", alarm.message),
                AlarmLevel::Warning => warn!(sensor = %alarm.sensor, value = alarm.value, "⚠️ {}", alarm.message),
                AlarmLevel::Info => info!(sensor = %alarm.sensor, value = alarm.value, "{}", alarm.message),
            }

            let duplicate = log
                .active
                .iter()
                .any(|a| a.sensor == alarm.sensor && a.level == alarm.level);
            if !duplicate {
                log.active.push(alarm.clone());
            }

            log.history.push_back(alarm.clone());
            if log.history.len() > HISTORY_LIMIT {
                log.history.pop_front();
            }
        }
        raised
    }

    pub fn active(&self) -> Vec<Alarm> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .clone()
    }

    /// Up to `limit` most recent alarms, oldest first
    pub fn history(&self, limit: usize) -> Vec<Alarm> {
        let log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = log.history.len().saturating_sub(limit);
        log.history.iter().skip(skip).cloned().collect()
    }

    /// Clear active alarms of one sensor, or all of them. Returns how many were removed.
    pub fn clear(&self, sensor: Option<&str>) -> usize {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        let before = log.active.len();
        match sensor {
            Some(sensor) => log.active.retain(|a| a.sensor != sensor),
            None => log.active.clear(),
        }
        let removed = before - log.active.len();
        if removed > 0 {
            info!(sensor = sensor.unwrap_or("*"), removed, "Alarms cleared");
        }
        removed
    }
}

#[async_trait]
impl SnapshotObserver for AlarmMonitor {
    fn name(&self) -> &str {
        "alarms"
    }

    async fn on_commit(
        &self,
        snapshot: &GatewaySnapshot,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let raised = self.evaluate(snapshot);

        let mut first_error = None;
        for alarm in &raised {
            for publisher in &self.publishers {
                if let Err(e) = publisher.publish_alarm(alarm).await {
                    warn!(sensor = %alarm.sensor, error = %e, "Failed to publish alarm");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
