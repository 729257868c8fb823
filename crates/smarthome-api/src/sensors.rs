use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Value, json};
use smarthome_common::{
    Error, Sensor, SensorCreate, SensorStatus, SensorType, SensorUpdate, SensorValidator,
    SensorValueUpdate, TemperatureReading,
};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

/// `GET /api/v1/sensors`
pub async fn list(State(state): State<SharedState>) -> ApiResult<Json<Vec<Sensor>>> {
    let mut sensors = state.sensors.list()?;
    for sensor in sensors.iter_mut() {
        attach_live_reading(&state, sensor).await;
    }
    Ok(Json(sensors))
}

/// `GET /api/v1/sensors/{id}`
pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Sensor>> {
    let id = parse_id(&id)?;
    let mut sensor = state
        .sensors
        .get(id)?
        .ok_or_else(|| Error::NotFound(format!("sensor {id}")))?;
    attach_live_reading(&state, &mut sensor).await;
    Ok(Json(sensor))
}

/// `POST /api/v1/sensors`
pub async fn create(
    State(state): State<SharedState>,
    payload: Result<Json<SensorCreate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Sensor>)> {
    let Json(mut input) = payload.map_err(bad_body)?;
    input.name = SensorValidator::sanitize(&input.name);
    input.location = SensorValidator::sanitize(&input.location);
    SensorValidator::validate_create(&input)?;

    let sensor = state.sensors.create(&input)?;
    Ok((StatusCode::CREATED, Json(sensor)))
}

/// `PUT /api/v1/sensors/{id}`
pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<SensorUpdate>, JsonRejection>,
) -> ApiResult<Json<Sensor>> {
    let id = parse_id(&id)?;
    let Json(mut input) = payload.map_err(bad_body)?;
    input.name = input.name.as_deref().map(SensorValidator::sanitize);
    input.location = input.location.as_deref().map(SensorValidator::sanitize);
    SensorValidator::validate_update(&input)?;

    Ok(Json(state.sensors.update(id, &input)?))
}

/// `DELETE /api/v1/sensors/{id}`
pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    state.sensors.delete(id)?;
    Ok(Json(json!({ "message": "Sensor deleted successfully" })))
}

/// `PATCH /api/v1/sensors/{id}/value`
pub async fn update_value(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<SensorValueUpdate>, JsonRejection>,
) -> ApiResult<Json<Sensor>> {
    let id = parse_id(&id)?;
    let Json(input) = payload.map_err(bad_body)?;
    SensorValidator::validate_value(&input)?;

    let status = input.status.unwrap_or(SensorStatus::Active);
    Ok(Json(state.sensors.update_value(id, input.value, status)?))
}

/// `GET /api/v1/sensors/temperature/{location}`
pub async fn temperature_by_location(
    State(state): State<SharedState>,
    Path(location): Path<String>,
) -> ApiResult<Json<TemperatureReading>> {
    if location.trim().is_empty() {
        return Err(Error::Validation("location is required".into()).into());
    }
    Ok(Json(state.temperature.by_location(&location).await?))
}

/// Overlay the live reading for temperature sensors. Upstream failures keep
/// the stored values.
async fn attach_live_reading(state: &SharedState, sensor: &mut Sensor) {
    if sensor.sensor_type != SensorType::Temperature {
        return;
    }

    match state.temperature.by_location(&sensor.location).await {
        Ok(reading) => {
            sensor.value = reading.value;
            sensor.status = SensorStatus::Active;
            sensor.last_updated = reading.timestamp;
        }
        Err(e) => {
            warn!(
                "failed to fetch temperature for sensor {} ({}): {}",
                sensor.id, sensor.location, e
            );
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError(Error::Validation(format!("invalid sensor id: {raw}"))))
}

fn bad_body(rejection: JsonRejection) -> ApiError {
    ApiError(Error::Validation(rejection.body_text()))
}
