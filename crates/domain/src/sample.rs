//! Sensor samples and the report payload shared with the bridge.

use serde::{Deserialize, Serialize};

use crate::device::PowerState;
use crate::time::Timestamp;

/// A continuous metric a sensor can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Humidity,
    Pressure,
}

impl Metric {
    /// Unit suffix used in notifications and logs.
    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::Pressure => "hPa",
        }
    }

    pub const ALL: [Self; 3] = [Self::Temperature, Self::Humidity, Self::Pressure];
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Temperature => f.write_str("temperature"),
            Self::Humidity => f.write_str("humidity"),
            Self::Pressure => f.write_str("pressure"),
        }
    }
}

/// A discrete alarm class reported by sensors.
///
/// These are binary signals, not noisy continuous ones, so alerting treats
/// them with a plain latch instead of hysteresis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    WaterLeak,
    BatteryLow,
}

impl std::fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaterLeak => f.write_str("water leak"),
            Self::BatteryLow => f.write_str("low battery"),
        }
    }
}

/// One metric reading from one device at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub device: String,
    pub metric: Metric,
    pub value: f64,
    pub timestamp: Timestamp,
}

/// Decoded per-device report payload from the bridge.
///
/// The bridge publishes a flat JSON object per device; fields we do not model
/// are ignored. Wire decoding itself stays in the MQTT adapter — this type is
/// only the shape both sides agree on.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeviceReport {
    pub state: Option<PowerState>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub water_leak: Option<bool>,
    pub battery_low: Option<bool>,
}

impl DeviceReport {
    /// The continuous metric readings present in this report.
    pub fn metrics(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        [
            (Metric::Temperature, self.temperature),
            (Metric::Humidity, self.humidity),
            (Metric::Pressure, self.pressure),
        ]
        .into_iter()
        .filter_map(|(metric, value)| value.map(|v| (metric, v)))
    }

    /// The binary alarm flags present in this report.
    pub fn alarms(&self) -> impl Iterator<Item = (AlarmKind, bool)> + '_ {
        [
            (AlarmKind::WaterLeak, self.water_leak),
            (AlarmKind::BatteryLow, self.battery_low),
        ]
        .into_iter()
        .filter_map(|(kind, value)| value.map(|v| (kind, v)))
    }
}
