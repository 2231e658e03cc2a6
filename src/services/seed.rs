// src/services/seed.rs

// Dados de demonstração para desenvolvimento.

use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

use crate::{
    common::error::AppError,
    location::estados::ESTADOS,
    models::{
        anuncio::{AnuncioPatch, AnuncioStatus, ModeracaoPayload},
        auth::UserRole,
    },
    services::{anuncio_service::AnuncioService, auth::AuthService},
};

const NOMES: &[&str] = &["Ana", "Bia", "Carla", "Duda", "Eva", "Fernanda", "Gabi", "Helena", "Isa", "Júlia", "Lara", "Mel"];
const CATEGORIAS: &[&str] = &["Acompanhante", "Massagem", "Dançarina", "Modelo"];
const SERVICOS: &[&str] = &["jantar", "eventos", "viagens", "massagem relaxante", "pernoite"];

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub anuncios: usize,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct SeedSummary {
    pub admin_criado: bool,
    pub anunciante_criado: bool,
    pub anuncios_criados: usize,
}

/// Idempotente para contas: e-mails já existentes são reaproveitados.
pub async fn run_seed<R: Rng + ?Sized>(
    auth: &AuthService,
    anuncios: &AnuncioService,
    options: &SeedOptions,
    rng: &mut R,
) -> Result<SeedSummary, AppError> {
    let mut summary = SeedSummary::default();

    if let (Some(email), Some(password)) = (&options.admin_email, &options.admin_password) {
        summary.admin_criado = ensure_user(auth, email, password, "Administração", UserRole::Admin).await?.1;
    }

    let (anunciante, criado) =
        ensure_user(auth, "anunciante@exemplo.com", "anunciante123", "Anunciante Demo", UserRole::Advertiser).await?;
    summary.anunciante_criado = criado;

    for i in 0..options.anuncios {
        let estado = ESTADOS.choose(rng).unwrap_or(&ESTADOS[0]);
        let nome = NOMES.choose(rng).copied().unwrap_or("Ana");
        let servicos: Vec<String> = SERVICOS
            .choose_multiple(rng, 2)
            .map(|s| s.to_string())
            .collect();

        let patch = AnuncioPatch {
            nome: Some(format!("{} {}", nome, i + 1)),
            categoria: CATEGORIAS.choose(rng).map(|c| c.to_string()),
            descricao: Some(format!("Perfil de demonstração em {}.", estado.nome)),
            idade: Some(rng.gen_range(18..=45).to_string()),
            telefone: Some(format!("{:02}9{:08}", rng.gen_range(11..=99), rng.gen_range(0..100_000_000u32))),
            estado: Some(estado.sigla.to_string()),
            cidade: (!estado.is_distrito_federal()).then(|| format!("Cidade {}", estado.sigla)),
            preco: Some(format!("R$ {}", rng.gen_range(10..=60) * 10)),
            servicos: Some(servicos),
            foto_capa_url: Some(format!("https://placehold.co/600x800?text={}", nome)),
            ..AnuncioPatch::default()
        };

        let anuncio = anuncios.create(Some(&anunciante), patch).await?;
        // Metade já aprovada para a vitrine ter conteúdo
        if rng.gen_bool(0.5) {
            anuncios
                .moderate(
                    anuncio.id,
                    ModeracaoPayload { status: Some(AnuncioStatus::Ativo), verificado: Some(rng.gen_bool(0.3)) },
                )
                .await?;
        }
        summary.anuncios_criados += 1;
    }

    tracing::info!(
        "🌱 Seed concluído: admin={} anunciante={} anúncios={}",
        summary.admin_criado,
        summary.anunciante_criado,
        summary.anuncios_criados
    );
    Ok(summary)
}

async fn ensure_user(
    auth: &AuthService,
    email: &str,
    password: &str,
    nome: &str,
    role: UserRole,
) -> Result<(crate::models::auth::User, bool), AppError> {
    if let Some(user) = auth.user_repo().find_by_email(&email.trim().to_lowercase()).await? {
        return Ok((user, false));
    }
    let user = auth.create_user_with_role(email, password, Some(nome.to_string()), role).await?;
    Ok((user, true))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        db::{MemoryAnuncioRepository, MemoryUserRepository},
        location::vitrine::ShowcaseStore,
        models::anuncio::AnuncioFilter,
    };

    #[tokio::test]
    async fn seed_is_idempotent_for_accounts() {
        let auth = AuthService::new(
            Arc::new(MemoryUserRepository::new()),
            "segredo".to_string(),
            chrono::Duration::hours(1),
            4,
        );
        let anuncios = AnuncioService::new(Arc::new(MemoryAnuncioRepository::new()), ShowcaseStore::new());
        let options = SeedOptions {
            anuncios: 5,
            admin_email: Some("admin@exemplo.com".into()),
            admin_password: Some("admin123".into()),
        };
        let mut rng = StdRng::seed_from_u64(7);

        let first = run_seed(&auth, &anuncios, &options, &mut rng).await.expect("seed");
        assert!(first.admin_criado);
        assert_eq!(first.anuncios_criados, 5);

        let second = run_seed(&auth, &anuncios, &options, &mut rng).await.expect("seed de novo");
        assert!(!second.admin_criado);
        assert!(!second.anunciante_criado);

        let admin = auth.user_repo().find_by_email("admin@exemplo.com").await.expect("busca").expect("admin");
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(anuncios.list(&AnuncioFilter::default()).await.expect("lista").len(), 10);
    }
}
