use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{routes::fallback::method_not_allowed, state::AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub message: &'static str,
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health).fallback(method_not_allowed))
        .route("/test", get(api_test).fallback(method_not_allowed))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Server is running",
        timestamp: state.clock.now(),
    })
}

pub async fn api_test() -> Json<TestResponse> {
    Json(TestResponse {
        message: "API is working!",
    })
}
