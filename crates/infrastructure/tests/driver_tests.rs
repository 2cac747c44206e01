use async_trait::async_trait;
use domain::{BusTransport, DeviceKind, DomainError, ReadRequest};
use infrastructure::config::DeviceConfig;
use infrastructure::drivers::{BatteryDriver, DriverFactory, LightDriver};
use mockall::mock;
use mockall::predicate::eq;
use std::time::Duration;

mock! {
    pub Transport {}

    #[async_trait]
    impl BusTransport for Transport {
        async fn exchange(
            &self,
            address: u8,
            request: &ReadRequest,
            timeout: Duration,
        ) -> Result<Vec<u16>, DomainError>;
    }
}

fn driver_for(kind: DeviceKind) -> infrastructure::DeviceDriver {
    DriverFactory::create_driver(&DeviceConfig::default_for(kind), Duration::from_millis(500))
}

#[tokio::test]
async fn light_poll_reads_two_holding_registers_at_its_address() {
    let mut bus = MockTransport::new();
    bus.expect_exchange()
        .with(eq(1u8), eq(LightDriver::REQUEST), eq(Duration::from_millis(500)))
        .times(1)
        .returning(|_, _, _| Ok(vec![0x0000, 0xC350]));

    let reading = driver_for(DeviceKind::Light).poll(&bus).await.unwrap();
    let light = reading.as_light().unwrap();
    assert_eq!(light.illuminance, 50_000);
    assert!(!light.is_dark);
}

#[tokio::test]
async fn per_device_timeout_overrides_bus_default() {
    let config = DeviceConfig::Motion {
        address: 2,
        timeout_ms: Some(150),
    };
    let driver = DriverFactory::create_driver(&config, Duration::from_secs(2));

    let mut bus = MockTransport::new();
    bus.expect_exchange()
        .withf(|address, _, timeout| *address == 2 && *timeout == Duration::from_millis(150))
        .times(1)
        .returning(|_, _, _| Ok(vec![1]));

    let reading = driver.poll(&bus).await.unwrap();
    assert!(reading.as_motion().unwrap().motion_detected);
}

#[tokio::test]
async fn transport_errors_pass_through_unchanged() {
    let mut bus = MockTransport::new();
    bus.expect_exchange().returning(|address, _, timeout| {
        Err(DomainError::Timeout {
            address,
            timeout_ms: timeout.as_millis() as u64,
        })
    });

    let err = driver_for(DeviceKind::Power).poll(&bus).await.unwrap_err();
    assert_eq!(
        err,
        DomainError::Timeout {
            address: 3,
            timeout_ms: 500
        }
    );
}

#[tokio::test]
async fn malformed_response_is_a_decode_error() {
    let mut bus = MockTransport::new();
    bus.expect_exchange().returning(|_, _, _| Ok(vec![1, 2, 3]));

    let err = driver_for(DeviceKind::Environment)
        .poll(&bus)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Decode(_)));
}

#[tokio::test]
async fn battery_reads_both_blocks() {
    let mut bus = MockTransport::new();
    bus.expect_exchange()
        .with(eq(4u8), eq(BatteryDriver::ELECTRICAL), eq(Duration::from_millis(500)))
        .times(1)
        .returning(|_, _, _| Ok(vec![1250, 100]));
    bus.expect_exchange()
        .with(eq(4u8), eq(BatteryDriver::STATUS), eq(Duration::from_millis(500)))
        .times(1)
        .returning(|_, _, _| Ok(vec![25, 97, 210, 60, 30]));

    let reading = driver_for(DeviceKind::Battery).poll(&bus).await.unwrap();
    let battery = reading.as_battery().unwrap();
    assert_eq!(battery.voltage, 12.5);
    assert_eq!(battery.state_of_charge, 25);
    assert!(battery.low_power_mode);
}

#[tokio::test]
async fn battery_status_failure_fails_the_whole_poll() {
    let mut bus = MockTransport::new();
    bus.expect_exchange()
        .with(eq(4u8), eq(BatteryDriver::ELECTRICAL), mockall::predicate::always())
        .returning(|_, _, _| Ok(vec![1250, 100]));
    bus.expect_exchange()
        .with(eq(4u8), eq(BatteryDriver::STATUS), mockall::predicate::always())
        .returning(|_, _, _| Err(DomainError::Transport("crc mismatch".into())));

    let err = driver_for(DeviceKind::Battery).poll(&bus).await.unwrap_err();
    assert!(matches!(err, DomainError::Transport(_)));
}
