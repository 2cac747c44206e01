use serde::{Deserialize, Serialize};

use crate::output::OutputChannel;
use crate::reading::DeviceKind;
use crate::snapshot::GatewaySnapshot;

/// Boolean signal derived from a reading that can drive an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    /// Light sensor reports darkness
    IsDark,
    /// PIR sensor reports movement
    MotionDetected,
    /// Battery state of charge is below the low-power threshold
    LowPowerMode,
}

impl RuleSource {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::IsDark => DeviceKind::Light,
            Self::MotionDetected => DeviceKind::Motion,
            Self::LowPowerMode => DeviceKind::Battery,
        }
    }

    /// Current value of the signal, if the source device answered in the
    /// latest cycle.
    pub fn value(&self, snapshot: &GatewaySnapshot) -> Option<bool> {
        let reading = snapshot
            .status(self.kind())
            .filter(|s| s.is_fresh())
            .and_then(|s| s.last_reading.as_ref())?;

        match self {
            Self::IsDark => reading.as_light().map(|l| l.is_dark),
            Self::MotionDetected => reading.as_motion().map(|m| m.motion_detected),
            Self::LowPowerMode => reading.as_battery().map(|b| b.low_power_mode),
        }
    }
}

/// Drives one output from one derived signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRule {
    pub channel: OutputChannel,
    pub source: RuleSource,
    /// Energize the output when the signal is false instead of true
    #[serde(default)]
    pub invert: bool,
}

impl RelayRule {
    pub fn desired_state(&self, snapshot: &GatewaySnapshot) -> Option<bool> {
        self.source.value(snapshot).map(|v| v != self.invert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::reading::{BatteryValues, LightValues, ReadingValues};
    use crate::snapshot::fixtures::snapshot_with;

    fn rule(channel: usize, source: RuleSource, invert: bool) -> RelayRule {
        RelayRule {
            channel: OutputChannel::new(channel).unwrap(),
            source,
            invert,
        }
    }

    #[test]
    fn test_direct_and_inverted_rules() {
        let snapshot = snapshot_with(vec![
            ReadingValues::Light(LightValues {
                illuminance: 5_000,
                is_dark: true,
            }),
            ReadingValues::Battery(BatteryValues {
                voltage: 11.8,
                current: 0.5,
                power: 5.9,
                state_of_charge: 25,
                state_of_health: 90,
                temperature: 30.0,
                discharge_minutes: 40,
                charge_minutes: 90,
                low_power_mode: true,
            }),
        ]);

        assert_eq!(
            rule(0, RuleSource::IsDark, false).desired_state(&snapshot),
            Some(true)
        );
        assert_eq!(
            rule(2, RuleSource::LowPowerMode, true).desired_state(&snapshot),
            Some(false)
        );
        assert_eq!(
            rule(1, RuleSource::MotionDetected, false).desired_state(&snapshot),
            None
        );
    }

    #[test]
    fn test_failing_source_yields_nothing() {
        let mut snapshot = snapshot_with(vec![ReadingValues::Light(LightValues {
            illuminance: 5_000,
            is_dark: true,
        })]);
        snapshot
            .devices
            .get_mut(&DeviceKind::Light)
            .unwrap()
            .record_failure(
                &DomainError::Timeout {
                    address: 1,
                    timeout_ms: 100,
                },
                chrono::Utc::now(),
            );

        assert_eq!(rule(0, RuleSource::IsDark, false).desired_state(&snapshot), None);
    }

    #[test]
    fn test_rule_deserialization() {
        let rule: RelayRule =
            serde_json::from_str(r#"{"channel": 2, "source": "low_power_mode", "invert": true}"#)
                .unwrap();
        assert_eq!(rule.channel.index(), 2);
        assert_eq!(rule.source, RuleSource::LowPowerMode);
        assert!(rule.invert);
    }
}
