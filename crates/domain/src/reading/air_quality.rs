use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirQualityLevel {
    Excellent,
    Moderate,
    Poor,
    Bad,
    Unhealthy,
}

impl AirQualityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::Bad => "Bad",
            Self::Unhealthy => "Unhealthy",
        }
    }
}

/// Air quality derived from particulate and CO2 concentration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirQuality {
    pub level: AirQualityLevel,
    /// 0 (best) to 100 (worst) in steps of 25
    pub score: u8,
}

impl AirQuality {
    /// Each pollutant contributes 0, 1 or 2 points; the sum selects the level.
    pub fn classify(pm2_5: f32, co2: f32) -> Self {
        let mut points = 0;
        if pm2_5 > 55.0 {
            points += 2;
        } else if pm2_5 > 35.0 {
            points += 1;
        }
        if co2 > 2000.0 {
            points += 2;
        } else if co2 > 1200.0 {
            points += 1;
        }

        let (level, score) = match points {
            0 => (AirQualityLevel::Excellent, 0),
            1 => (AirQualityLevel::Moderate, 25),
            2 => (AirQualityLevel::Poor, 50),
            3 => (AirQualityLevel::Bad, 75),
            _ => (AirQualityLevel::Unhealthy, 100),
        };
        Self { level, score }
    }
}

/// Coarse weather guess from climate readings and outdoor light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherEstimate {
    SunnyAndWarm,
    ColdAndRainy,
    CoolAndPartlyCloudy,
    MildAndHumid,
    Unsettled,
}

impl WeatherEstimate {
    pub fn estimate(temperature: f32, humidity: f32, lux: u32) -> Self {
        let lux = lux as f32;
        if temperature > 25.0 && humidity < 50.0 && lux > 20_000.0 {
            Self::SunnyAndWarm
        } else if temperature < 10.0 && humidity > 70.0 && lux < 10_000.0 {
            Self::ColdAndRainy
        } else if (10.0..=20.0).contains(&temperature)
            && (50.0..=70.0).contains(&humidity)
            && (10_000.0..=20_000.0).contains(&lux)
        {
            Self::CoolAndPartlyCloudy
        } else if (15.0..=25.0).contains(&temperature) && humidity > 70.0 && lux < 15_000.0 {
            Self::MildAndHumid
        } else {
            Self::Unsettled
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SunnyAndWarm => "Sunny and warm",
            Self::ColdAndRainy => "Cold and rainy",
            Self::CoolAndPartlyCloudy => "Cool and partly cloudy",
            Self::MildAndHumid => "Mild and humid",
            Self::Unsettled => "Unsettled",
        }
    }
}
