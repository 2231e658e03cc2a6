// src/handlers/users.rs

use axum::{extract::State, Json};

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{auth::User, location::LocationPreferences},
};

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Usuário autenticado", body = User),
        (status = 401, description = "Não autenticado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> ApiResponse<User> {
    ApiResponse::ok(user)
}

#[utoipa::path(
    get,
    path = "/api/users/me/preferencias",
    tag = "Users",
    responses((status = 200, description = "Preferências de localização", body = LocationPreferences)),
    security(("api_jwt" = []))
)]
pub async fn get_preferences(AuthenticatedUser(user): AuthenticatedUser) -> ApiResponse<LocationPreferences> {
    ApiResponse::ok(user.preferencias)
}

#[utoipa::path(
    put,
    path = "/api/users/me/preferencias",
    tag = "Users",
    request_body = LocationPreferences,
    responses(
        (status = 200, description = "Preferências salvas (estados como sigla da UF)", body = LocationPreferences),
        (status = 400, description = "Estado desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_preferences(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<LocationPreferences>,
) -> Result<ApiResponse<LocationPreferences>, AppError> {
    let prefs = payload.normalized()?;
    let updated = app_state
        .auth_service
        .user_repo()
        .update_preferences(user.id, prefs)
        .await?
        .ok_or(AppError::UserNotFound)?;

    Ok(ApiResponse::ok(updated.preferencias))
}
