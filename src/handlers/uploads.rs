// src/handlers/uploads.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    models::upload::{UploadPayload, UploadedFile},
};

// POST /api/upload
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "Uploads",
    request_body = UploadPayload,
    responses(
        (status = 201, description = "Arquivo salvo", body = UploadedFile),
        (status = 400, description = "Base64 inválido ou arquivo vazio"),
        (status = 413, description = "Arquivo grande demais"),
        (status = 415, description = "Extensão não permitida"),
        (status = 429, description = "Muitos envios")
    )
)]
pub async fn upload(
    State(app_state): State<AppState>,
    Json(payload): Json<UploadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let uploaded = app_state.upload_service.upload(payload).await?;
    Ok(ApiResponse::created(uploaded))
}

// GET /api/image/{filename}
#[utoipa::path(
    get,
    path = "/api/image/{filename}",
    tag = "Uploads",
    params(("filename" = String, Path, description = "Nome do arquivo salvo")),
    responses(
        (status = 200, description = "Conteúdo do arquivo"),
        (status = 404, description = "Arquivo não encontrado")
    )
)]
pub async fn get_image(
    State(app_state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (bytes, content_type) = app_state.upload_service.read(&filename).await?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=86400"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        bytes,
    ))
}
