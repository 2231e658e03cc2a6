// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::{error::AppError, text::clean_optional},
    db::UserRepository,
    models::auth::{Claims, NewUser, User, UserRole, UserStatus},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    jwt_secret: String,
    token_ttl: chrono::Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        jwt_secret: String,
        token_ttl: chrono::Duration,
        bcrypt_cost: u32,
    ) -> Self {
        Self { user_repo, jwt_secret, token_ttl, bcrypt_cost }
    }

    pub fn user_repo(&self) -> &Arc<dyn UserRepository> {
        &self.user_repo
    }

    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        nome: Option<String>,
        role: Option<UserRole>,
    ) -> Result<(String, User), AppError> {
        let role = role.unwrap_or_default();
        if role == UserRole::Admin {
            return Err(AppError::Forbidden);
        }

        let user = self.create_user_with_role(email, password, nome, role).await?;
        tracing::info!("👤 Novo usuário registrado: {} ({})", user.email, user.role.as_str());

        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    /// Cria a conta com a role informada (inclusive admin). Usado pelo cadastro,
    /// pelo assistente de cadastro e pelo seed.
    pub async fn create_user_with_role(
        &self,
        email: &str,
        password: &str,
        nome: Option<String>,
        role: UserRole,
    ) -> Result<User, AppError> {
        let email = email.trim().to_lowercase();

        // Verificação rápida; a garantia real é o índice único no banco
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        // Hashing em um thread separado
        let password_clone = password.to_owned();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        self.user_repo
            .create(NewUser { email, password_hash, nome: clean_optional(nome), role })
            .await
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<(String, User), AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::warn!("🔒 Tentativa de login com senha incorreta para {}", user.email);
            return Err(AppError::InvalidCredentials);
        }

        if user.status == UserStatus::Bloqueado {
            return Err(AppError::AccountDisabled);
        }

        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if user.status == UserStatus::Bloqueado {
            return Err(AppError::AccountDisabled);
        }
        Ok(user)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryUserRepository;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryUserRepository::new()),
            "segredo-de-teste".to_string(),
            chrono::Duration::hours(24),
            4,
        )
    }

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let auth = service();
        let (_, user) = auth
            .register_user("Maria@Exemplo.com ", "senha123", Some("Maria".into()), None)
            .await
            .expect("registro");
        assert_eq!(user.email, "maria@exemplo.com");
        assert_eq!(user.role, UserRole::User);

        let (token, logged) = auth.login_user("maria@exemplo.com", "senha123").await.expect("login");
        assert_eq!(logged.id, user.id);
        let validated = auth.validate_token(&token).await.expect("token válido");
        assert_eq!(validated.id, user.id);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let auth = service();
        auth.register_user("joao@exemplo.com", "senha123", None, None).await.expect("registro");
        let result = auth.login_user("joao@exemplo.com", "errada!").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn admin_role_cannot_be_self_assigned() {
        let auth = service();
        let result = auth.register_user("x@exemplo.com", "senha123", None, Some(UserRole::Admin)).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn blocked_account_cannot_login() {
        let auth = service();
        let (_, user) = auth.register_user("b@exemplo.com", "senha123", None, None).await.expect("registro");
        auth.user_repo().update_status(user.id, UserStatus::Bloqueado).await.expect("bloqueio");
        let result = auth.login_user("b@exemplo.com", "senha123").await;
        assert!(matches!(result, Err(AppError::AccountDisabled)));
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let auth = service();
        let (_, user) = auth.register_user("c@exemplo.com", "senha123", None, None).await.expect("registro");
        let other = AuthService::new(
            auth.user_repo().clone(),
            "outro-segredo".to_string(),
            chrono::Duration::hours(1),
            4,
        );
        let foreign = other.create_token(&user).expect("token");
        assert!(matches!(auth.validate_token(&foreign).await, Err(AppError::InvalidToken)));
    }
}
