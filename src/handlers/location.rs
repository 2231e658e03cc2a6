// src/handlers/location.rs

use axum::{extract::State, Json};

use crate::{config::AppState, middleware::client_ip::ClientIp, models::location::LocationResponse};

// Sempre 200: a falha vem como { "sucesso": false }
#[utoipa::path(
    get,
    path = "/api/location",
    tag = "Localização",
    responses((status = 200, description = "Estado/cidade estimados pelo IP", body = LocationResponse))
)]
pub async fn get_location(State(app_state): State<AppState>, ClientIp(ip): ClientIp) -> Json<LocationResponse> {
    Json(app_state.location_service.detect(ip).await)
}
