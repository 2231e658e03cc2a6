// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;
use validator::Validate;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::auth::{session_cookie, TOKEN_COOKIE},
    models::auth::{AuthResponse, LoginUserPayload, RegisterUserPayload},
};

// Handler de registro
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado; token no corpo e no cookie", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (token, user) = app_state
        .auth_service
        .register_user(&payload.email, &payload.password, payload.nome, payload.role)
        .await?;

    let jar = jar.add(session_cookie(token.clone()));
    Ok((StatusCode::CREATED, jar, ApiResponse::ok(AuthResponse { token, user })))
}

// Handler de login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login realizado", body = AuthResponse),
        (status = 401, description = "E-mail ou senha inválidos"),
        (status = 403, description = "Conta bloqueada")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (token, user) = app_state.auth_service.login_user(&payload.email, &payload.password).await?;
    tracing::info!("🔑 Login: {}", user.email);

    let jar = jar.add(session_cookie(token.clone()));
    Ok((jar, ApiResponse::ok(AuthResponse { token, user })))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Cookie de sessão removido"))
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    // Sempre devolve o cookie expirado, mesmo se o navegador não mandou nenhum
    let mut expired = Cookie::new(TOKEN_COOKIE, "");
    expired.set_path("/");
    expired.make_removal();
    (jar.add(expired), Json(json!({ "success": true })))
}
