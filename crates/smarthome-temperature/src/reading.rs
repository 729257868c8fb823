use chrono::Utc;
use rand::Rng;
use smarthome_common::TemperatureReading;

pub const UNIT: &str = "°C";
pub const SENSOR_TYPE: &str = "temperature";

/// Readings are drawn uniformly from `[MIN_CELSIUS, MIN_CELSIUS + SPAN_CELSIUS)`.
pub const MIN_CELSIUS: f64 = 15.0;
pub const SPAN_CELSIUS: f64 = 15.0;

const KNOWN_SENSORS: [(&str, &str); 3] = [
    ("1", "Living Room"),
    ("2", "Bedroom"),
    ("3", "Kitchen"),
];

pub const UNKNOWN_LOCATION: &str = "Unknown";
pub const UNKNOWN_SENSOR_ID: &str = "0";

pub fn location_for(sensor_id: &str) -> &'static str {
    KNOWN_SENSORS
        .iter()
        .find(|(id, _)| *id == sensor_id)
        .map_or(UNKNOWN_LOCATION, |&(_, location)| location)
}

pub fn sensor_id_for(location: &str) -> &'static str {
    KNOWN_SENSORS
        .iter()
        .find(|(_, known)| *known == location)
        .map_or(UNKNOWN_SENSOR_ID, |&(id, _)| id)
}

/// Comfort band of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comfort {
    Cold,
    Comfortable,
    Hot,
}

impl Comfort {
    pub fn classify(celsius: f64) -> Self {
        if celsius < 18.0 {
            Self::Cold
        } else if celsius < 25.0 {
            Self::Comfortable
        } else {
            Self::Hot
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cold => "Cold",
            Self::Comfortable => "Comfortable",
            Self::Hot => "Hot",
        }
    }
}

/// How the caller addressed the sensor; only changes the description text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    Query,
    SensorPath,
}

/// Draw a value and truncate it to one decimal.
pub fn sample(rng: &mut impl Rng) -> f64 {
    let raw = MIN_CELSIUS + rng.random::<f64>() * SPAN_CELSIUS;
    (raw * 10.0).trunc() / 10.0
}

pub fn reading(
    rng: &mut impl Rng,
    sensor_id: &str,
    location: &str,
    addressing: Addressing,
) -> TemperatureReading {
    let value = sample(rng);
    let status = Comfort::classify(value).as_str();
    let description = match addressing {
        Addressing::Query => format!("Temperature in {location}: {value:.1}{UNIT} ({status})"),
        Addressing::SensorPath => format!(
            "Temperature in {location} (sensor {sensor_id}): {value:.1}{UNIT} ({status})"
        ),
    };

    TemperatureReading {
        sensor_id: sensor_id.to_string(),
        sensor_type: SENSOR_TYPE.to_string(),
        location: location.to_string(),
        value,
        unit: UNIT.to_string(),
        status: status.to_string(),
        timestamp: Utc::now(),
        description,
    }
}
