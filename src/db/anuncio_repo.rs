// src/db/anuncio_repo.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{error::AppError, text::fold_text},
    db::AnuncioRepository,
    models::anuncio::{Anuncio, AnuncioFilter, AnuncioPatch},
};

// Os anúncios são documentos JSONB; as colunas soltas existem só para filtrar.
#[derive(Clone)]
pub struct PgAnuncioRepository {
    pool: PgPool,
}

impl PgAnuncioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_row(tx: &mut Transaction<'_, Postgres>, anuncio: &Anuncio) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE anuncios
               SET data = $2, categoria = $3, status = $4, estado_uf = $5, cidade_norm = $6, updated_at = $7
             WHERE id = $1
            "#,
        )
        .bind(anuncio.id)
        .bind(Json(anuncio))
        .bind(anuncio.categoria.as_deref().map(fold_text))
        .bind(anuncio.status.as_str())
        .bind(anuncio.estado_uf().map(|e| e.sigla))
        .bind(anuncio.cidade_normalizada())
        .bind(anuncio.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AnuncioRepository for PgAnuncioRepository {
    async fn insert(&self, anuncio: &Anuncio) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO anuncios (id, user_id, data, categoria, status, estado_uf, cidade_norm, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(anuncio.id)
        .bind(anuncio.user_id)
        .bind(Json(anuncio))
        .bind(anuncio.categoria.as_deref().map(fold_text))
        .bind(anuncio.status.as_str())
        .bind(anuncio.estado_uf().map(|e| e.sigla))
        .bind(anuncio.cidade_normalizada())
        .bind(anuncio.created_at)
        .bind(anuncio.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Anuncio>, AppError> {
        let row: Option<(Json<Anuncio>,)> = sqlx::query_as("SELECT data FROM anuncios WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(Json(anuncio),)| anuncio))
    }

    async fn list(&self, filter: &AnuncioFilter) -> Result<Vec<Anuncio>, AppError> {
        // LIMIT NULL = sem limite
        let rows: Vec<(Json<Anuncio>,)> = sqlx::query_as(
            r#"
            SELECT data FROM anuncios
             WHERE ($1::text IS NULL OR categoria = $1)
               AND ($2::text IS NULL OR status = $2)
               AND ($3::text IS NULL OR estado_uf = $3)
               AND ($4::text IS NULL OR cidade_norm = $4)
             ORDER BY created_at DESC
             LIMIT $5
            "#,
        )
        .bind(filter.categoria.as_deref().map(fold_text))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.estado.map(|e| e.sigla))
        .bind(filter.cidade.as_deref().map(fold_text))
        .bind(filter.limit.map(|l| l as i64))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(Json(anuncio),)| anuncio).collect())
    }

    async fn update(&self, id: Uuid, patch: AnuncioPatch) -> Result<Option<Anuncio>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Trava a linha: duas edições simultâneas não perdem campos uma da outra
        let row: Option<(Json<Anuncio>,)> =
            sqlx::query_as("SELECT data FROM anuncios WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((Json(mut anuncio),)) = row else {
            return Ok(None);
        };

        anuncio.apply_patch(patch, Utc::now());
        Self::write_row(&mut tx, &anuncio).await?;

        tx.commit().await?;
        Ok(Some(anuncio))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM anuncios WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize, AppError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM anuncios")
            .fetch_one(&self.pool)
            .await?;
        Ok(total as usize)
    }
}
