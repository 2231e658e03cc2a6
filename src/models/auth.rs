// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::location::LocationPreferences;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    #[serde(alias = "anunciante")]
    Advertiser,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Advertiser => "advertiser",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(UserRole::User),
            "advertiser" | "anunciante" => Some(UserRole::Advertiser),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    #[serde(alias = "active")]
    Ativo,
    #[serde(alias = "blocked")]
    Bloqueado,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Ativo => "ativo",
            UserStatus::Bloqueado => "bloqueado",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ativo" | "active" => Some(UserStatus::Ativo),
            "bloqueado" | "blocked" => Some(UserStatus::Bloqueado),
            _ => None,
        }
    }
}

// Representa um usuário/anunciante vindo do banco de dados
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "anunciante@exemplo.com.br")]
    pub email: String,

    #[serde(skip_serializing, default)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub nome: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,

    #[serde(default)]
    pub preferencias: LocationPreferences,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// Dados para criação de um usuário (já com a senha em hash)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub nome: Option<String>,
    pub role: UserRole,
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "anunciante@exemplo.com.br")]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[serde(alias = "name")]
    #[validate(length(min = 2, max = 120, message = "O nome deve ter entre 2 e 120 caracteres."))]
    pub nome: Option<String>,
    // "user" ou "advertiser"; "admin" não pode ser escolhido no cadastro
    pub role: Option<UserRole>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub email: String,
    pub role: UserRole,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

// Admin: bloquear / desbloquear conta
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserStatusPayload {
    pub status: UserStatus,
}
