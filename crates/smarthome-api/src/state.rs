use std::sync::Arc;

use smarthome_db::SensorStore;

use crate::temperature::TemperatureClient;

/// Shared application state accessible from all request handlers.
pub struct AppState {
    pub sensors: SensorStore,
    pub temperature: TemperatureClient,
}

impl AppState {
    pub fn new(sensors: SensorStore, temperature: TemperatureClient) -> Self {
        Self {
            sensors,
            temperature,
        }
    }
}

pub type SharedState = Arc<AppState>;
