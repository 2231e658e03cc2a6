// src/db/memory.rs

// Repositórios em memória. Usados quando DATABASE_URL não está definida
// (desenvolvimento) e nos testes. Mesma semântica das versões PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AnuncioRepository, UserRepository},
    models::{
        anuncio::{Anuncio, AnuncioFilter, AnuncioPatch},
        auth::{NewUser, User, UserStatus},
        location::LocationPreferences,
    },
};

#[derive(Default)]
pub struct MemoryAnuncioRepository {
    anuncios: RwLock<HashMap<Uuid, Anuncio>>,
}

impl MemoryAnuncioRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnuncioRepository for MemoryAnuncioRepository {
    async fn insert(&self, anuncio: &Anuncio) -> Result<(), AppError> {
        self.anuncios.write().await.insert(anuncio.id, anuncio.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Anuncio>, AppError> {
        Ok(self.anuncios.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &AnuncioFilter) -> Result<Vec<Anuncio>, AppError> {
        let guard = self.anuncios.read().await;
        let mut result: Vec<Anuncio> = guard.values().filter(|a| filter.matches(a)).cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = filter.limit {
            result.truncate(limit);
        }
        Ok(result)
    }

    async fn update(&self, id: Uuid, patch: AnuncioPatch) -> Result<Option<Anuncio>, AppError> {
        // O lock de escrita cobre leitura + escrita
        let mut guard = self.anuncios.write().await;
        let Some(anuncio) = guard.get_mut(&id) else {
            return Ok(None);
        };
        anuncio.apply_patch(patch, Utc::now());
        Ok(Some(anuncio.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.anuncios.write().await.remove(&id).is_some())
    }

    async fn count(&self) -> Result<usize, AppError> {
        Ok(self.anuncios.read().await.len())
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let guard = self.users.read().await;
        Ok(guard.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        // Verificação e inserção sob o mesmo lock: sem corrida de e-mail duplicado
        let mut guard = self.users.write().await;
        if guard.values().any(|u| u.email.eq_ignore_ascii_case(&new_user.email)) {
            return Err(AppError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            nome: new_user.nome,
            role: new_user.role,
            status: UserStatus::Ativo,
            preferencias: LocationPreferences::default(),
            created_at: now,
            updated_at: now,
        };
        guard.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_status(&self, id: Uuid, status: UserStatus) -> Result<Option<User>, AppError> {
        let mut guard = self.users.write().await;
        Ok(guard.get_mut(&id).map(|user| {
            user.status = status;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_preferences(&self, id: Uuid, prefs: LocationPreferences) -> Result<Option<User>, AppError> {
        let mut guard = self.users.write().await;
        Ok(guard.get_mut(&id).map(|user| {
            user.preferencias = prefs;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn count(&self) -> Result<usize, AppError> {
        Ok(self.users.read().await.len())
    }
}
