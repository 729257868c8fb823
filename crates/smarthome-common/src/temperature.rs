use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single reading as served by the temperature API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureReading {
    pub sensor_id: String,
    pub sensor_type: String,
    pub location: String,
    pub value: f64,
    pub unit: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// Liveness payload of the temperature API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_uses_camel_case_on_the_wire() {
        let reading = TemperatureReading {
            sensor_id: "1".into(),
            sensor_type: "temperature".into(),
            location: "Living Room".into(),
            value: 21.3,
            unit: "°C".into(),
            status: "Comfortable".into(),
            timestamp: Utc::now(),
            description: "Temperature in Living Room: 21.3°C (Comfortable)".into(),
        };

        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["sensorId"], "1");
        assert_eq!(json["sensorType"], "temperature");
        assert!(json.get("sensor_id").is_none());
    }
}
