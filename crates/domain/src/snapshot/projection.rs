use serde_json::{Map, Value, json};

use super::GatewaySnapshot;
use crate::reading::{DeviceKind, WeatherEstimate};

pub(super) fn sensor_fields(snapshot: &GatewaySnapshot) -> Map<String, Value> {
    let mut fields = Map::new();
    let lux = snapshot
        .reading(DeviceKind::Light)
        .and_then(|r| r.as_light())
        .map(|l| l.illuminance);

    if let Some(light) = snapshot.reading(DeviceKind::Light).and_then(|r| r.as_light()) {
        fields.insert("ldr_lux".into(), json!(light.illuminance));
        fields.insert("is_dark".into(), json!(light.is_dark));
    }

    if let Some(env) = snapshot
        .reading(DeviceKind::Environment)
        .and_then(|r| r.as_environment())
    {
        fields.insert("co2".into(), json!(env.co2));
        fields.insert("temperature".into(), json!(env.temperature));
        fields.insert("humidity".into(), json!(env.humidity));
        fields.insert("pm2_5".into(), json!(env.pm2_5));
        fields.insert("pm10".into(), json!(env.pm10));
        fields.insert("illumination".into(), json!(env.illumination));
        fields.insert("air_quality".into(), json!(env.air_quality.level.as_str()));
        fields.insert("air_quality_score".into(), json!(env.air_quality.score));
        let weather = WeatherEstimate::estimate(env.temperature, env.humidity, lux.unwrap_or(0));
        fields.insert("weather_status".into(), json!(weather.as_str()));
    }

    if let Some(motion) = snapshot.reading(DeviceKind::Motion).and_then(|r| r.as_motion()) {
        fields.insert("motion_detected".into(), json!(motion.motion_detected));
        fields.insert("display_should_be_on".into(), json!(motion.motion_detected));
    }

    if let Some(power) = snapshot.reading(DeviceKind::Power).and_then(|r| r.as_power()) {
        fields.insert("pv_voltage".into(), json!(power.pv_voltage));
        fields.insert("pv_current".into(), json!(power.pv_current));
        fields.insert("pv_power".into(), json!(power.pv_power));
        let status = if power.pv_power > 0.0 { "Charging" } else { "Idle" };
        fields.insert("mppt_status".into(), json!(status));
    }

    if let Some(battery) = snapshot
        .reading(DeviceKind::Battery)
        .and_then(|r| r.as_battery())
    {
        fields.insert("battery_voltage".into(), json!(battery.voltage));
        fields.insert("battery_current".into(), json!(battery.current));
        fields.insert("battery_power".into(), json!(battery.power));
        fields.insert("battery_soc".into(), json!(battery.state_of_charge));
        fields.insert("battery_soh".into(), json!(battery.state_of_health));
        fields.insert("battery_temp".into(), json!(battery.temperature));
        fields.insert("discharge_time".into(), json!(battery.discharge_minutes));
        fields.insert("charge_time".into(), json!(battery.charge_minutes));
        fields.insert("bms_low_power_mode".into(), json!(battery.low_power_mode));
    }

    fields.insert("updated_at".into(), json!(snapshot.taken_at));
    fields
}
