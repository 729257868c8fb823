pub mod error;
pub mod sensor;
pub mod temperature;
pub mod validation;

pub use error::{Error, Result};
pub use sensor::{Sensor, SensorCreate, SensorStatus, SensorType, SensorUpdate, SensorValueUpdate};
pub use temperature::{HealthReport, TemperatureReading};
pub use validation::SensorValidator;
