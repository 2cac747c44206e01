use std::collections::HashMap;

use async_trait::async_trait;
use domain::{DeviceKind, DomainError, ReadRequest, RegisterBank};

use super::RegisterLink;

/// In-process stand-in for the field devices.
///
/// Each configured address answers with the register image of its device
/// kind. Values follow slow sine waves over wall-clock time so the dashboard
/// has something moving, within the ranges real installations report.
pub struct SimulatorLink {
    devices: HashMap<u8, DeviceKind>,
    fixed_time: Option<f64>,
}

type RegisterImage = HashMap<(RegisterBank, u16), u16>;

impl SimulatorLink {
    pub fn new(devices: impl IntoIterator<Item = (u8, DeviceKind)>) -> Self {
        Self {
            devices: devices.into_iter().collect(),
            fixed_time: None,
        }
    }

    /// Freeze the simulated clock (seconds since the epoch)
    pub fn at_time(mut self, seconds: f64) -> Self {
        self.fixed_time = Some(seconds);
        self
    }

    fn now(&self) -> f64 {
        self.fixed_time.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs_f64()
        })
    }

    fn image(kind: DeviceKind, t: f64) -> RegisterImage {
        let mut image = RegisterImage::new();
        match kind {
            DeviceKind::Light => {
                let lux = wave(t, 120.0, 0.0, 5_000.0, 45_000.0) as u32;
                image.insert((RegisterBank::Holding, 0x0000), (lux >> 16) as u16);
                image.insert((RegisterBank::Holding, 0x0001), lux as u16);
            }
            DeviceKind::Environment => {
                let values = [
                    (0x0008, wave(t, 300.0, 0.0, 400.0, 1_500.0)),
                    (0x000A, wave(t, 200.0, 1.0, 5.0, 80.0)),
                    (0x000C, wave(t, 200.0, 1.5, 10.0, 150.0)),
                    (0x000E, wave(t, 600.0, 2.0, 5.0, 35.0)),
                    (0x0010, wave(t, 400.0, 3.0, 30.0, 90.0)),
                    (0x0012, wave(t, 120.0, 0.0, 1_000.0, 50_000.0)),
                ];
                for (start, value) in values {
                    let bits = (value as f32).to_bits();
                    image.insert((RegisterBank::Holding, start), (bits >> 16) as u16);
                    image.insert((RegisterBank::Holding, start + 1), bits as u16);
                }
            }
            DeviceKind::Motion => {
                // Alternates every 15 seconds
                let detected = ((t / 15.0) as u64) % 2 == 0;
                image.insert((RegisterBank::Holding, 0x0006), detected as u16);
            }
            DeviceKind::Power => {
                let volts = wave(t, 180.0, 0.5, 15.0, 20.0);
                let amps = wave(t, 90.0, 1.0, 2.0, 8.0);
                image.insert((RegisterBank::Input, 0x3000), (volts * 100.0) as u16);
                image.insert((RegisterBank::Input, 0x3001), (amps * 100.0) as u16);
            }
            DeviceKind::Battery => {
                let volts = wave(t, 240.0, 0.0, 11.5, 13.0);
                let amps = wave(t, 90.0, 2.0, 0.5, 5.0);
                let soc = wave(t, 900.0, 0.0, 10.0, 100.0);
                let temp = wave(t, 600.0, 1.0, 20.0, 45.0);
                image.insert((RegisterBank::Input, 0x3004), (volts * 100.0) as u16);
                image.insert((RegisterBank::Input, 0x3005), (amps * 100.0) as u16);
                image.insert((RegisterBank::Input, 0x3020), soc as u16);
                image.insert((RegisterBank::Input, 0x3021), wave(t, 3_600.0, 0.0, 80.0, 100.0) as u16);
                image.insert((RegisterBank::Input, 0x3022), (temp * 10.0) as u16);
                image.insert((RegisterBank::Input, 0x3023), wave(t, 500.0, 0.5, 30.0, 180.0) as u16);
                image.insert((RegisterBank::Input, 0x3024), wave(t, 500.0, 2.5, 15.0, 120.0) as u16);
            }
        }
        image
    }
}

/// Sine wave between `min` and `max` with the given period in seconds
fn wave(t: f64, period: f64, phase: f64, min: f64, max: f64) -> f64 {
    let unit = 0.5 + 0.5 * (t * 2.0 * std::f64::consts::PI / period + phase).sin();
    min + (max - min) * unit
}

#[async_trait]
impl RegisterLink for SimulatorLink {
    async fn read(&mut self, address: u8, request: &ReadRequest) -> Result<Vec<u16>, DomainError> {
        let kind = self.devices.get(&address).ok_or_else(|| {
            DomainError::Transport(format!("No simulated device at address {}", address))
        })?;

        let image = Self::image(*kind, self.now());
        (0..request.count)
            .map(|offset| {
                let register = request.start.wrapping_add(offset);
                image.get(&(request.bank, register)).copied().ok_or_else(|| {
                    DomainError::Transport(format!(
                        "Modbus exception from device {}: illegal data address {:#06x}",
                        address, register
                    ))
                })
            })
            .collect()
    }

    fn reset(&mut self) {}

    fn describe(&self) -> String {
        format!("simulator:{} devices", self.devices.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_stays_in_range() {
        for step in 0..1000 {
            let v = wave(step as f64 * 0.37, 60.0, 1.0, 10.0, 20.0);
            assert!((10.0..=20.0).contains(&v));
        }
    }

    #[tokio::test]
    async fn test_light_image() {
        let mut link = SimulatorLink::new([(1, DeviceKind::Light)]).at_time(0.0);
        let words = link.read(1, &ReadRequest::holding(0, 2)).await.unwrap();
        let lux = ((words[0] as u32) << 16) | words[1] as u32;
        assert_eq!(lux, 25_000);
    }

    #[tokio::test]
    async fn test_unknown_address_and_register() {
        let mut link = SimulatorLink::new([(1, DeviceKind::Light)]);
        assert!(matches!(
            link.read(9, &ReadRequest::holding(0, 2)).await,
            Err(DomainError::Transport(_))
        ));
        assert!(matches!(
            link.read(1, &ReadRequest::input(0, 2)).await,
            Err(DomainError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_battery_blocks_are_readable() {
        let mut link = SimulatorLink::new([(4, DeviceKind::Battery)]);
        assert_eq!(
            link.read(4, &ReadRequest::input(0x3004, 2)).await.unwrap().len(),
            2
        );
        assert_eq!(
            link.read(4, &ReadRequest::input(0x3020, 5)).await.unwrap().len(),
            5
        );
    }
}
