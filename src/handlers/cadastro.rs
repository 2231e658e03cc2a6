// src/handlers/cadastro.rs

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::auth::session_cookie,
    models::{anuncio::Anuncio, auth::User},
    services::wizard_service::WizardView,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct CadastroConcluido {
    pub token: String,
    pub user: User,
    pub anuncio: Anuncio,
}

/// Aceita "3" ou "tela3".
fn parse_tela(raw: &str) -> Result<u8, AppError> {
    raw.trim()
        .trim_start_matches("tela")
        .parse()
        .map_err(|_| AppError::WizardError(format!("Tela '{}' inválida.", raw)))
}

// O formulário manda strings, mas aceitamos booleanos e números (ex: aceite_termos: true)
fn flatten_fields(body: BTreeMap<String, Value>) -> Result<BTreeMap<String, String>, AppError> {
    body.into_iter()
        .map(|(campo, valor)| {
            let texto = match valor {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Null => String::new(),
                _ => return Err(AppError::WizardError(format!("Campo '{}' deve ser texto.", campo))),
            };
            Ok((campo, texto))
        })
        .collect()
}

#[utoipa::path(
    post,
    path = "/api/cadastro",
    tag = "Cadastro",
    responses((status = 201, description = "Sessão de cadastro iniciada na tela 0", body = WizardView))
)]
pub async fn start(State(app_state): State<AppState>) -> impl IntoResponse {
    let state = app_state.wizard_service.start().await;
    ApiResponse::created(state.view())
}

#[utoipa::path(
    get,
    path = "/api/cadastro/{id}",
    tag = "Cadastro",
    params(("id" = Uuid, Path, description = "ID da sessão de cadastro")),
    responses(
        (status = 200, description = "Estado atual do cadastro", body = WizardView),
        (status = 404, description = "Sessão não encontrada ou expirada")
    )
)]
pub async fn get_session(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<WizardView>, AppError> {
    Ok(ApiResponse::ok(app_state.wizard_service.get(id).await?.view()))
}

#[utoipa::path(
    put,
    path = "/api/cadastro/{id}/telas/{tela}",
    tag = "Cadastro",
    params(
        ("id" = Uuid, Path, description = "ID da sessão de cadastro"),
        ("tela" = String, Path, description = "Número da tela (0..14) ou 'telaN'")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Tela salva; avança se era a tela atual", body = WizardView),
        (status = 400, description = "Campos inválidos ou tela à frente da atual")
    )
)]
pub async fn submit_screen(
    State(app_state): State<AppState>,
    Path((id, tela)): Path<(Uuid, String)>,
    Json(body): Json<BTreeMap<String, Value>>,
) -> Result<ApiResponse<WizardView>, AppError> {
    let numero = parse_tela(&tela)?;
    let campos = flatten_fields(body)?;
    let state = app_state.wizard_service.submit(id, numero, campos).await?;
    Ok(ApiResponse::ok(state.view()))
}

#[utoipa::path(
    post,
    path = "/api/cadastro/{id}/voltar",
    tag = "Cadastro",
    params(("id" = Uuid, Path, description = "ID da sessão de cadastro")),
    responses((status = 200, description = "Voltou uma tela", body = WizardView))
)]
pub async fn back(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<WizardView>, AppError> {
    Ok(ApiResponse::ok(app_state.wizard_service.back(id).await?.view()))
}

#[utoipa::path(
    post,
    path = "/api/cadastro/{id}/concluir",
    tag = "Cadastro",
    params(("id" = Uuid, Path, description = "ID da sessão de cadastro")),
    responses(
        (status = 201, description = "Conta de anunciante e anúncio pendente criados", body = CadastroConcluido),
        (status = 400, description = "Cadastro incompleto"),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn finish(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (token, user, anuncio) = app_state.wizard_service.finish(id).await?;

    let jar = jar.add(session_cookie(token.clone()));
    let (status, body) = ApiResponse::created(CadastroConcluido { token, user, anuncio });
    Ok((status, jar, body))
}
