use axum::Json;
use axum::Router;
use axum::http::{Method, header};
use axum::routing::{get, patch};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::sensors;
use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/sensors", get(sensors::list).post(sensors::create))
        .route(
            "/sensors/{id}",
            get(sensors::get).put(sensors::update).delete(sensors::delete),
        )
        .route("/sensors/{id}/value", patch(sensors::update_value))
        .route(
            "/sensors/temperature/{location}",
            get(sensors::temperature_by_location),
        )
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
