use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Kind of physical sensor registered in a home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    Temperature,
    Humidity,
    Pressure,
    Motion,
    Light,
}

impl SensorType {
    pub const ALL: [SensorType; 5] = [
        SensorType::Temperature,
        SensorType::Humidity,
        SensorType::Pressure,
        SensorType::Motion,
        SensorType::Light,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Humidity => "humidity",
            SensorType::Pressure => "pressure",
            SensorType::Motion => "motion",
            SensorType::Light => "light",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("unknown sensor type: {s}")))
    }
}

/// Operational state of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Active,
    #[default]
    Inactive,
    Maintenance,
    Error,
}

impl SensorStatus {
    pub const ALL: [SensorStatus; 4] = [
        SensorStatus::Active,
        SensorStatus::Inactive,
        SensorStatus::Maintenance,
        SensorStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Active => "active",
            SensorStatus::Inactive => "inactive",
            SensorStatus::Maintenance => "maintenance",
            SensorStatus::Error => "error",
        }
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("unknown sensor status: {s}")))
    }
}

/// A sensor as stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub location: String,
    pub value: f64,
    pub unit: String,
    pub status: SensorStatus,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Payload for registering a new sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub location: String,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Partial update. Absent fields and empty strings leave the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub sensor_type: Option<SensorType>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub status: Option<SensorStatus>,
}

/// A new reading pushed for a sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorValueUpdate {
    pub value: f64,
    #[serde(default)]
    pub status: Option<SensorStatus>,
}
