// src/services/admin_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{error::AppError, text::fold_text},
    db::{AnuncioRepository, UserRepository},
    models::{
        admin::AdminStats,
        anuncio::AnuncioFilter,
        auth::{User, UserStatus},
    },
};

#[derive(Clone)]
pub struct AdminService {
    anuncio_repo: Arc<dyn AnuncioRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl AdminService {
    pub fn new(anuncio_repo: Arc<dyn AnuncioRepository>, user_repo: Arc<dyn UserRepository>) -> Self {
        Self { anuncio_repo, user_repo }
    }

    /// Painel: totais por status, estado e categoria.
    pub async fn stats(&self) -> Result<AdminStats, AppError> {
        let anuncios = self.anuncio_repo.list(&AnuncioFilter::default()).await?;
        let mut stats = AdminStats {
            total_anuncios: anuncios.len(),
            total_usuarios: self.user_repo.count().await?,
            ..AdminStats::default()
        };

        for anuncio in &anuncios {
            *stats.por_status.entry(anuncio.status.as_str().to_string()).or_default() += 1;

            let estado = anuncio.estado_uf().map_or("??", |e| e.sigla);
            *stats.por_estado.entry(estado.to_string()).or_default() += 1;

            let categoria = anuncio
                .categoria
                .as_deref()
                .map(fold_text)
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "sem categoria".to_string());
            *stats.por_categoria.entry(categoria).or_default() += 1;

            if anuncio.verificado {
                stats.verificados += 1;
            }
        }

        Ok(stats)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list().await
    }

    pub async fn set_user_status(&self, admin: &User, id: Uuid, status: UserStatus) -> Result<User, AppError> {
        if admin.id == id && status == UserStatus::Bloqueado {
            return Err(AppError::BadRequest("Um admin não pode bloquear a própria conta.".to_string()));
        }
        let user = self
            .user_repo
            .update_status(id, status)
            .await?
            .ok_or(AppError::UserNotFound)?;
        tracing::info!("🛡️ Usuário {} agora está {}", user.email, user.status.as_str());
        Ok(user)
    }
}
