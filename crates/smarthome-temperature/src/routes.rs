use axum::extract::{Path, Query};
use axum::http::{Method, header};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use smarthome_common::{HealthReport, TemperatureReading};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::reading::{self, Addressing};

pub const SERVICE_MESSAGE: &str = "Temperature API is running!";
pub const SERVICE_VERSION: &str = "1.0.0";

pub fn build_router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/temperature", get(by_query))
        .route("/temperature/health", get(health))
        .route("/temperature/{sensor_id}", get(by_sensor_id))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
}

/// Query string of `GET /temperature`. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureQuery {
    pub location: Option<String>,
    pub sensor_id: Option<String>,
}

impl TemperatureQuery {
    /// Fill in whichever of location and sensor id is missing from the other.
    pub fn resolve(&self) -> (String, String) {
        let location = present(&self.location);
        let sensor_id = present(&self.sensor_id);

        let location = match location {
            Some(l) => l.to_string(),
            None => reading::location_for(sensor_id.unwrap_or_default()).to_string(),
        };
        let sensor_id = match sensor_id {
            Some(id) => id.to_string(),
            None => reading::sensor_id_for(&location).to_string(),
        };
        (sensor_id, location)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": SERVICE_MESSAGE,
        "version": SERVICE_VERSION,
    }))
}

async fn by_query(Query(query): Query<TemperatureQuery>) -> Json<TemperatureReading> {
    let (sensor_id, location) = query.resolve();
    let reading = reading::reading(&mut rand::rng(), &sensor_id, &location, Addressing::Query);
    debug!("served {} for {}", reading.value, reading.location);
    Json(reading)
}

async fn by_sensor_id(Path(sensor_id): Path<String>) -> Json<TemperatureReading> {
    let location = reading::location_for(&sensor_id);
    let reading = reading::reading(
        &mut rand::rng(),
        &sensor_id,
        location,
        Addressing::SensorPath,
    );
    debug!("served {} for sensor {}", reading.value, sensor_id);
    Json(reading)
}

async fn health() -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok".to_string(),
        message: SERVICE_MESSAGE.to_string(),
        timestamp: Utc::now(),
    })
}
