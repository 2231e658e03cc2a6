pub mod anuncio_repo;
pub use anuncio_repo::PgAnuncioRepository;
pub mod user_repo;
pub use user_repo::PgUserRepository;
pub mod memory;
pub use memory::{MemoryAnuncioRepository, MemoryUserRepository};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        anuncio::{Anuncio, AnuncioFilter, AnuncioPatch},
        auth::{NewUser, User, UserStatus},
        location::LocationPreferences,
    },
};

// Repositório de anúncios. Duas implementações: PostgreSQL e memória.
#[async_trait]
pub trait AnuncioRepository: Send + Sync {
    async fn insert(&self, anuncio: &Anuncio) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Anuncio>, AppError>;

    /// Mais recentes primeiro.
    async fn list(&self, filter: &AnuncioFilter) -> Result<Vec<Anuncio>, AppError>;

    /// Leitura + escrita atômicas: só os campos presentes no patch mudam.
    async fn update(&self, id: Uuid, patch: AnuncioPatch) -> Result<Option<Anuncio>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn count(&self) -> Result<usize, AppError>;
}

// Repositório de usuários/anunciantes
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Falha com `EmailAlreadyExists` se o e-mail já estiver em uso.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn list(&self) -> Result<Vec<User>, AppError>;

    async fn update_status(&self, id: Uuid, status: UserStatus) -> Result<Option<User>, AppError>;

    async fn update_preferences(&self, id: Uuid, prefs: LocationPreferences) -> Result<Option<User>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn count(&self) -> Result<usize, AppError>;
}
