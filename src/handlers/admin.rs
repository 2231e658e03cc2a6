// src/handlers/admin.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, RoleAdmin},
    },
    models::{
        admin::AdminStats,
        anuncio::{Anuncio, ListAnunciosQuery, ModeracaoPayload},
        auth::{User, UserStatusPayload},
    },
};

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Totais do painel", body = AdminStats),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_stats(
    _guard: RequireRole<RoleAdmin>,
    State(app_state): State<AppState>,
) -> Result<ApiResponse<AdminStats>, AppError> {
    Ok(ApiResponse::ok(app_state.admin_service.stats().await?))
}

// Sem filtro de status por padrão: o admin vê pendentes e rejeitados também
#[utoipa::path(
    get,
    path = "/api/admin/anuncios",
    tag = "Admin",
    params(ListAnunciosQuery),
    responses((status = 200, description = "Todos os anúncios", body = [Anuncio])),
    security(("api_jwt" = []))
)]
pub async fn list_anuncios(
    _guard: RequireRole<RoleAdmin>,
    State(app_state): State<AppState>,
    Query(query): Query<ListAnunciosQuery>,
) -> Result<ApiResponse<Vec<Anuncio>>, AppError> {
    let filter = query.into_filter()?;
    Ok(ApiResponse::ok(app_state.anuncio_service.list(&filter).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/anuncios/{id}/moderacao",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do anúncio")),
    request_body = ModeracaoPayload,
    responses(
        (status = 200, description = "Anúncio moderado", body = Anuncio),
        (status = 404, description = "Anúncio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn moderate_anuncio(
    _guard: RequireRole<RoleAdmin>,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModeracaoPayload>,
) -> Result<ApiResponse<Anuncio>, AppError> {
    Ok(ApiResponse::ok(app_state.anuncio_service.moderate(id, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/usuarios",
    tag = "Admin",
    responses((status = 200, description = "Usuários cadastrados", body = [User])),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    _guard: RequireRole<RoleAdmin>,
    State(app_state): State<AppState>,
) -> Result<ApiResponse<Vec<User>>, AppError> {
    Ok(ApiResponse::ok(app_state.admin_service.list_users().await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/usuarios/{id}/status",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = UserStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = User),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_user_status(
    _guard: RequireRole<RoleAdmin>,
    State(app_state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserStatusPayload>,
) -> Result<ApiResponse<User>, AppError> {
    let user = app_state.admin_service.set_user_status(&admin, id, payload.status).await?;
    Ok(ApiResponse::ok(user))
}
