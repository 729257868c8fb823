use crate::error::{Error, Result};
use crate::sensor::{SensorCreate, SensorUpdate, SensorValueUpdate};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_LOCATION_LEN: usize = 100;
pub const MAX_UNIT_LEN: usize = 20;
pub const MIN_VALUE: f64 = -50.0;
pub const MAX_VALUE: f64 = 100.0;

/// Field validation for sensor payloads before they reach the store.
pub struct SensorValidator;

impl SensorValidator {
    pub fn validate_create(input: &SensorCreate) -> Result<()> {
        Self::require_text("name", &input.name, MAX_NAME_LEN)?;
        Self::require_text("location", &input.location, MAX_LOCATION_LEN)?;
        if let Some(unit) = &input.unit {
            Self::bounded_text("unit", unit, MAX_UNIT_LEN)?;
        }
        Ok(())
    }

    pub fn validate_update(input: &SensorUpdate) -> Result<()> {
        if let Some(name) = &input.name {
            Self::bounded_text("name", name, MAX_NAME_LEN)?;
        }
        if let Some(location) = &input.location {
            Self::bounded_text("location", location, MAX_LOCATION_LEN)?;
        }
        if let Some(unit) = &input.unit {
            Self::bounded_text("unit", unit, MAX_UNIT_LEN)?;
        }
        if let Some(value) = input.value {
            Self::value_in_range(value)?;
        }
        Ok(())
    }

    pub fn validate_value(input: &SensorValueUpdate) -> Result<()> {
        Self::value_in_range(input.value)
    }

    /// Strip control characters from free-form text fields.
    pub fn sanitize(input: &str) -> String {
        input.chars().filter(|c| !c.is_control()).collect()
    }

    fn require_text(field: &str, value: &str, max: usize) -> Result<()> {
        if value.trim().is_empty() {
            return Err(Error::Validation(format!("{field} is required")));
        }
        Self::bounded_text(field, value, max)
    }

    fn bounded_text(field: &str, value: &str, max: usize) -> Result<()> {
        if value.chars().count() > max {
            return Err(Error::Validation(format!(
                "{field} must be at most {max} characters"
            )));
        }
        Ok(())
    }

    fn value_in_range(value: f64) -> Result<()> {
        if !value.is_finite() || !(MIN_VALUE..=MAX_VALUE).contains(&value) {
            return Err(Error::Validation(format!(
                "value must be between {MIN_VALUE} and {MAX_VALUE}"
            )));
        }
        Ok(())
    }
}
