// src/handlers/anuncios.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::auth::{AuthenticatedUser, MaybeUser},
    models::anuncio::{Anuncio, AnuncioPayload, ListAnunciosQuery},
};

// GET /api/anuncios
#[utoipa::path(
    get,
    path = "/api/anuncios",
    tag = "Anúncios",
    params(ListAnunciosQuery),
    responses(
        (status = 200, description = "Anúncios ativos, mais recentes primeiro (admin vê todos os status)", body = [Anuncio]),
        (status = 400, description = "Filtro inválido (estado ou status desconhecido)"),
        (status = 403, description = "Filtro por status diferente de 'ativo' sem ser admin")
    )
)]
pub async fn list_anuncios(
    State(app_state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<ListAnunciosQuery>,
) -> Result<ApiResponse<Vec<Anuncio>>, AppError> {
    let filter = query.into_filter()?;
    let anuncios = app_state.anuncio_service.list_for(viewer.as_ref(), filter).await?;
    Ok(ApiResponse::ok(anuncios))
}

// GET /api/anuncios/{id}
#[utoipa::path(
    get,
    path = "/api/anuncios/{id}",
    tag = "Anúncios",
    params(("id" = Uuid, Path, description = "ID do anúncio")),
    responses(
        (status = 200, description = "Anúncio", body = Anuncio),
        (status = 404, description = "Anúncio não encontrado (ou não ativo, para quem não é dono nem admin)")
    )
)]
pub async fn get_anuncio(
    State(app_state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Anuncio>, AppError> {
    Ok(ApiResponse::ok(app_state.anuncio_service.get_for(viewer.as_ref(), id).await?))
}

// POST /api/anuncios
#[utoipa::path(
    post,
    path = "/api/anuncios",
    tag = "Anúncios",
    request_body = AnuncioPayload,
    responses(
        (status = 201, description = "Anúncio criado como pendente", body = Anuncio),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "Não autenticado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_anuncio(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AnuncioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let anuncio = app_state.anuncio_service.create(Some(&user), payload.into_patch()).await?;
    Ok(ApiResponse::created(anuncio))
}

// PUT /api/anuncios/{id}
#[utoipa::path(
    put,
    path = "/api/anuncios/{id}",
    tag = "Anúncios",
    params(("id" = Uuid, Path, description = "ID do anúncio")),
    request_body = AnuncioPayload,
    responses(
        (status = 200, description = "Anúncio atualizado; campos ausentes ficam como estavam", body = Anuncio),
        (status = 403, description = "Não é o dono nem admin"),
        (status = 404, description = "Anúncio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_anuncio(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnuncioPayload>,
) -> Result<ApiResponse<Anuncio>, AppError> {
    payload.validate()?;

    let anuncio = app_state.anuncio_service.update(&user, id, payload.into_patch()).await?;
    Ok(ApiResponse::ok(anuncio))
}

// DELETE /api/anuncios/{id}
#[utoipa::path(
    delete,
    path = "/api/anuncios/{id}",
    tag = "Anúncios",
    params(("id" = Uuid, Path, description = "ID do anúncio")),
    responses(
        (status = 200, description = "Anúncio removido: { success, data: { id, message } }"),
        (status = 403, description = "Não é o dono nem admin"),
        (status = 404, description = "Anúncio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_anuncio(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    app_state.anuncio_service.delete(&user, id).await?;
    Ok(ApiResponse::ok(json!({ "id": id, "message": "Anúncio removido." })))
}
