// src/handlers/health.rs

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::config::AppState;

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Servidor no ar"))
)]
pub async fn health(State(app_state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "storage": app_state.storage_backend,
        "vitrinePronta": app_state.showcase.snapshot().is_some(),
    }))
}
