// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conta bloqueada")]
    AccountDisabled,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Anúncio não encontrado")]
    AnuncioNotFound,

    #[error("Arquivo não encontrado")]
    FileNotFound,

    #[error("Arquivo excede o limite de {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Tipo de arquivo não permitido: {0}")]
    UnsupportedFileType(String),

    #[error("Limite de envios atingido")]
    RateLimited,

    #[error("Estado desconhecido: {0}")]
    UnknownState(String),

    #[error("Cadastro: {0}")]
    WizardError(String),

    #[error("Sessão de cadastro não encontrada")]
    WizardSessionNotFound,

    #[error("Vitrine ainda não carregada")]
    ShowcaseNotReady,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de E/S: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    /// Erro de validação atribuído a um único campo, no mesmo formato do `validator`.
    pub fn field(field: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        let message: String = message.into();
        let mut err = validator::ValidationError::new(code);
        err.message = Some(message.into());
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, err);
        AppError::ValidationError(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "success": false,
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::BadRequest(ref msg) | AppError::WizardError(ref msg) => {
                let body = Json(json!({ "success": false, "error": msg }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::UnknownState(ref value) => {
                let body = Json(json!({
                    "success": false,
                    "error": format!("Estado '{}' não reconhecido.", value),
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::UnsupportedFileType(ref ext) => {
                let body = Json(json!({
                    "success": false,
                    "error": format!("Tipo de arquivo '{}' não é permitido.", ext),
                }));
                return (StatusCode::UNSUPPORTED_MEDIA_TYPE, body).into_response();
            }
            AppError::PayloadTooLarge(limit) => {
                let body = Json(json!({
                    "success": false,
                    "error": format!("O arquivo excede o limite de {} bytes.", limit),
                }));
                return (StatusCode::PAYLOAD_TOO_LARGE, body).into_response();
            }
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Este e-mail já está em uso."),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos."),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "Token de autenticação inválido ou ausente."),
            AppError::AccountDisabled => (StatusCode::FORBIDDEN, "Esta conta está bloqueada."),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Você não tem permissão para realizar esta ação."),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "Usuário não encontrado."),
            AppError::AnuncioNotFound => (StatusCode::NOT_FOUND, "Anúncio não encontrado."),
            AppError::FileNotFound => (StatusCode::NOT_FOUND, "Arquivo não encontrado."),
            AppError::WizardSessionNotFound => (StatusCode::NOT_FOUND, "Sessão de cadastro não encontrada ou expirada."),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "Muitos envios em pouco tempo. Tente novamente mais tarde."),
            AppError::ShowcaseNotReady => (StatusCode::SERVICE_UNAVAILABLE, "Os anúncios ainda estão sendo carregados."),

            // Todos os outros erros (banco, bcrypt, JWT, E/S, internos) viram 500.
            // A mensagem detalhada vai só para o log, nunca para o cliente.
            ref e => {
                tracing::error!("🔥 Erro Interno do Servidor: {} ({:?})", e, e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "success": false, "error": error_message }));
        (status, body).into_response()
    }
}
