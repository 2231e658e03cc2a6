// src/services/anuncio_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AnuncioRepository,
    location::vitrine::ShowcaseStore,
    models::{
        anuncio::{Anuncio, AnuncioFilter, AnuncioPatch, AnuncioStatus, ModeracaoPayload},
        auth::User,
    },
};

#[derive(Clone)]
pub struct AnuncioService {
    repo: Arc<dyn AnuncioRepository>,
    showcase: ShowcaseStore,
}

impl AnuncioService {
    pub fn new(repo: Arc<dyn AnuncioRepository>, showcase: ShowcaseStore) -> Self {
        Self { repo, showcase }
    }

    pub fn repo(&self) -> &Arc<dyn AnuncioRepository> {
        &self.repo
    }

    pub async fn list(&self, filter: &AnuncioFilter) -> Result<Vec<Anuncio>, AppError> {
        self.repo.list(filter).await
    }

    /// Listagem pública: quem não é admin só vê anúncios ativos, sem documentos.
    pub async fn list_for(&self, viewer: Option<&User>, mut filter: AnuncioFilter) -> Result<Vec<Anuncio>, AppError> {
        if !viewer.is_some_and(User::is_admin) {
            match filter.status {
                None | Some(AnuncioStatus::Ativo) => filter.status = Some(AnuncioStatus::Ativo),
                Some(_) => return Err(AppError::Forbidden),
            }
        }
        let anuncios = self.repo.list(&filter).await?;
        Ok(anuncios.into_iter().map(|a| a.for_viewer(viewer)).collect())
    }

    /// Anúncio não ativo só aparece para o dono ou admin; para os demais é 404.
    pub async fn get_for(&self, viewer: Option<&User>, id: Uuid) -> Result<Anuncio, AppError> {
        let anuncio = self.get(id).await?;
        let can_manage = viewer.is_some_and(|user| anuncio.is_managed_by(user));
        if anuncio.status != AnuncioStatus::Ativo && !can_manage {
            return Err(AppError::AnuncioNotFound);
        }
        Ok(anuncio.for_viewer(viewer))
    }

    pub async fn get(&self, id: Uuid) -> Result<Anuncio, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::AnuncioNotFound)
    }

    /// Cria o anúncio como "pendente", vinculado ao dono (se houver).
    pub async fn create(&self, owner: Option<&User>, patch: AnuncioPatch) -> Result<Anuncio, AppError> {
        patch.validate_limits()?;
        let anuncio = Anuncio::from_patch(Uuid::new_v4(), owner.map(|u| u.id), patch, Utc::now())?;
        self.repo.insert(&anuncio).await?;

        tracing::info!("📝 Anúncio criado: {} ({})", anuncio.id, anuncio.nome);
        self.showcase.request_refresh();
        Ok(anuncio)
    }

    pub async fn update(&self, user: &User, id: Uuid, patch: AnuncioPatch) -> Result<Anuncio, AppError> {
        patch.validate_limits()?;
        let current = self.get(id).await?;
        ensure_can_edit(user, &current)?;

        let updated = self.repo.update(id, patch).await?.ok_or(AppError::AnuncioNotFound)?;
        tracing::info!("✏️ Anúncio atualizado: {}", id);
        self.showcase.request_refresh();
        Ok(updated)
    }

    pub async fn delete(&self, user: &User, id: Uuid) -> Result<(), AppError> {
        let current = self.get(id).await?;
        ensure_can_edit(user, &current)?;

        if !self.repo.delete(id).await? {
            return Err(AppError::AnuncioNotFound);
        }
        tracing::info!("🗑️ Anúncio removido: {}", id);
        self.showcase.request_refresh();
        Ok(())
    }

    /// Moderação (admin): status e selo de verificado.
    pub async fn moderate(&self, id: Uuid, payload: ModeracaoPayload) -> Result<Anuncio, AppError> {
        if payload.status.is_none() && payload.verificado.is_none() {
            return Err(AppError::BadRequest("Informe 'status' e/ou 'verificado'.".to_string()));
        }

        let patch = AnuncioPatch {
            status: payload.status,
            verificado: payload.verificado,
            ..AnuncioPatch::default()
        };
        let updated = self.repo.update(id, patch).await?.ok_or(AppError::AnuncioNotFound)?;

        tracing::info!(
            "🛡️ Anúncio {} moderado: status={} verificado={}",
            id,
            updated.status.as_str(),
            updated.verificado
        );
        self.showcase.request_refresh();
        Ok(updated)
    }
}

/// Só o dono ou um admin podem alterar o anúncio.
fn ensure_can_edit(user: &User, anuncio: &Anuncio) -> Result<(), AppError> {
    if anuncio.is_managed_by(user) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
