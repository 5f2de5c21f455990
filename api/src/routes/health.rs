use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::response::ApiResponse;
use crate::state::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// GET /api/v1/health
///
/// Unauthenticated liveness probe.
pub async fn health_check() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(
        json!({
            "name": common::config::project_name(),
            "version": env!("CARGO_PKG_VERSION"),
        }),
        "ok",
    ))
}
