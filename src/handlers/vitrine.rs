// src/handlers/vitrine.rs

use axum::extract::{Query, State};

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    location::vitrine::{build_view, VitrineView, READY_TIMEOUT},
    models::{admin::EstadoCount, location::VitrineQuery},
};

// GET /api/vitrine
#[utoipa::path(
    get,
    path = "/api/vitrine",
    tag = "Vitrine",
    params(VitrineQuery),
    responses(
        (status = 200, description = "Anúncios ativos filtrados e embaralhados", body = VitrineView),
        (status = 400, description = "Estado ou visualização inválidos"),
        (status = 503, description = "Vitrine ainda não carregada")
    )
)]
pub async fn get_vitrine(
    State(app_state): State<AppState>,
    Query(query): Query<VitrineQuery>,
) -> Result<ApiResponse<VitrineView>, AppError> {
    let snapshot = app_state.showcase.ready(READY_TIMEOUT).await?;
    let view = build_view(&snapshot, &query, &mut rand::thread_rng())?;
    Ok(ApiResponse::ok(view))
}

// GET /api/vitrine/estados
#[utoipa::path(
    get,
    path = "/api/vitrine/estados",
    tag = "Vitrine",
    responses(
        (status = 200, description = "Total de anúncios ativos por estado", body = [EstadoCount]),
        (status = 503, description = "Vitrine ainda não carregada")
    )
)]
pub async fn get_estados(State(app_state): State<AppState>) -> Result<ApiResponse<Vec<EstadoCount>>, AppError> {
    let snapshot = app_state.showcase.ready(READY_TIMEOUT).await?;
    Ok(ApiResponse::ok(snapshot.counts.clone()))
}
