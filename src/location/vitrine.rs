// src/location/vitrine.rs

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::{sync::{watch, Notify}, task::JoinHandle};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::{error::AppError, text::clean_optional},
    db::AnuncioRepository,
    location::{
        estados::{by_sigla, normalize_state},
        filtro::{order_by_proximity, ProfilesState},
    },
    models::{
        admin::EstadoCount,
        anuncio::{Anuncio, AnuncioFilter, AnuncioStatus},
        location::VitrineQuery,
    },
};

/// Tempo máximo de espera pela primeira carga da vitrine.
pub const READY_TIMEOUT: Duration = Duration::from_secs(10);

// Uma carga completa dos anúncios ativos + contagem por estado.
#[derive(Debug)]
pub struct Snapshot {
    pub profiles: Vec<Anuncio>,
    pub counts: Vec<EstadoCount>,
    pub loaded_at: DateTime<Utc>,
}

impl Snapshot {
    fn build(profiles: Vec<Anuncio>) -> Self {
        let mut per_state: BTreeMap<&'static str, usize> = BTreeMap::new();
        for estado in profiles.iter().filter_map(Anuncio::estado_uf) {
            *per_state.entry(estado.sigla).or_default() += 1;
        }

        let mut counts: Vec<EstadoCount> = per_state
            .into_iter()
            .filter_map(|(sigla, total)| {
                by_sigla(sigla).map(|e| EstadoCount {
                    sigla: e.sigla.to_string(),
                    nome: e.nome.to_string(),
                    total,
                })
            })
            .collect();
        counts.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.sigla.cmp(&b.sigla)));

        Self { profiles, counts, loaded_at: Utc::now() }
    }
}

struct ShowcaseInner {
    snapshot: watch::Sender<Option<Arc<Snapshot>>>,
    refresh: Notify,
}

/// Dono único da vitrine. Quem precisa dos dados espera `ready()` em vez de
/// ficar consultando em intervalos.
#[derive(Clone)]
pub struct ShowcaseStore {
    inner: Arc<ShowcaseInner>,
}

impl Default for ShowcaseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ShowcaseStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(None);
        Self { inner: Arc::new(ShowcaseInner { snapshot, refresh: Notify::new() }) }
    }

    pub fn publish(&self, profiles: Vec<Anuncio>) -> Arc<Snapshot> {
        let snapshot = Arc::new(Snapshot::build(profiles));
        self.inner.snapshot.send_replace(Some(snapshot.clone()));
        snapshot
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.snapshot.borrow().clone()
    }

    pub async fn ready(&self, timeout: Duration) -> Result<Arc<Snapshot>, AppError> {
        let mut rx = self.inner.snapshot.subscribe();
        let waited = tokio::time::timeout(timeout, async {
            rx.wait_for(Option::is_some).await.map(|guard| guard.clone())
        })
        .await;

        match waited {
            Ok(Ok(Some(snapshot))) => Ok(snapshot),
            _ => Err(AppError::ShowcaseNotReady),
        }
    }

    /// Pede uma recarga antecipada (após criar/editar/remover anúncios).
    pub fn request_refresh(&self) {
        self.inner.refresh.notify_one();
    }

    /// Carrega os anúncios ativos do repositório e publica.
    pub async fn reload(&self, repo: &dyn AnuncioRepository) -> Result<Arc<Snapshot>, AppError> {
        let profiles = repo.list(&AnuncioFilter::only_status(AnuncioStatus::Ativo)).await?;
        let snapshot = self.publish(profiles);
        tracing::info!("🗂️ Vitrine recarregada: {} anúncios ativos", snapshot.profiles.len());
        Ok(snapshot)
    }

    /// Recarrega periodicamente e sempre que `request_refresh` for chamado.
    pub fn spawn_refresher(&self, repo: Arc<dyn AnuncioRepository>, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = store.reload(repo.as_ref()).await {
                    tracing::error!("🔥 Falha ao recarregar a vitrine: {}", e);
                }
                tokio::select! {
                    _ = tokio::time::sleep(every) => {}
                    _ = store.inner.refresh.notified() => {}
                }
            }
        })
    }
}

// ---
// Estratégias de exibição (tipadas, sem busca por nome de função)
// ---
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderStrategy {
    #[default]
    Cards,
    Compact,
    Count,
}

impl RenderStrategy {
    pub fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value.map(str::trim) {
            None | Some("") | Some("cards") => Ok(RenderStrategy::Cards),
            Some("compact") => Ok(RenderStrategy::Compact),
            Some("count") => Ok(RenderStrategy::Count),
            Some(other) => Err(AppError::BadRequest(format!("Visualização '{}' inválida.", other))),
        }
    }

    pub fn render(self, estado: Option<String>, total: usize, profiles: Vec<Anuncio>) -> VitrineView {
        let exibidos = profiles.len();
        match self {
            RenderStrategy::Cards => VitrineView::Cards {
                estado,
                total,
                exibidos,
                anuncios: profiles.into_iter().map(Anuncio::without_documents).collect(),
            },
            RenderStrategy::Compact => VitrineView::Compact {
                estado,
                total,
                exibidos,
                anuncios: profiles.iter().map(AnuncioResumo::from).collect(),
            },
            RenderStrategy::Count => VitrineView::Count { estado, total, exibidos },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagina {
    Home,
    Listagem,
}

impl Pagina {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "home" || v == "/" || v == "index" || v == "inicio" => Pagina::Home,
            _ => Pagina::Listagem,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnuncioResumo {
    pub id: Uuid,
    pub nome: String,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub foto_capa_url: Option<String>,
    pub preco: Option<String>,
    pub verificado: bool,
}

impl From<&Anuncio> for AnuncioResumo {
    fn from(a: &Anuncio) -> Self {
        Self {
            id: a.id,
            nome: a.nome.clone(),
            cidade: a.cidade.clone(),
            // Sigla normalizada quando reconhecida
            estado: a.estado_uf().map(|e| e.sigla.to_string()).or_else(|| a.estado.clone()),
            foto_capa_url: a.foto_capa_url.clone(),
            preco: a.preco.clone(),
            verificado: a.verificado,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum VitrineView {
    Cards { estado: Option<String>, total: usize, exibidos: usize, anuncios: Vec<Anuncio> },
    Compact { estado: Option<String>, total: usize, exibidos: usize, anuncios: Vec<AnuncioResumo> },
    Count { estado: Option<String>, total: usize, exibidos: usize },
}

/// Aplica a query da vitrine sobre uma carga.
pub fn build_view<R: Rng + ?Sized>(
    snapshot: &Snapshot,
    query: &VitrineQuery,
    rng: &mut R,
) -> Result<VitrineView, AppError> {
    let strategy = RenderStrategy::parse(query.view.as_deref())?;
    let pagina = Pagina::parse(query.pagina.as_deref());
    let proximidade = query.ordem.as_deref().map(str::trim) == Some("proximidade");

    let mut state = ProfilesState::new();
    state.load(snapshot.profiles.clone());

    // "?estado=" (opção "todos") conta como sem filtro
    let estado_raw = clean_optional(query.estado.clone());
    let cidade_raw = clean_optional(query.cidade.clone());

    // A home mostra tudo, sem filtro de estado
    let estado = if pagina == Pagina::Home { None } else { estado_raw.as_deref() };
    let cidade = if pagina == Pagina::Home { None } else { cidade_raw.as_deref() };

    let (selecionado, profiles) = if proximidade {
        let uf = match estado {
            Some(raw) => Some(normalize_state(raw).ok_or_else(|| AppError::UnknownState(raw.to_string()))?),
            None => None,
        };
        let all = state.apply_state_filter(None, rng)?.to_vec();
        (uf, order_by_proximity(all, uf, cidade, rng))
    } else {
        let filtered = state.apply_location_filter(estado, cidade, rng)?.to_vec();
        (state.selection(), filtered)
    };

    Ok(strategy.render(selecionado.map(|e| e.sigla.to_string()), state.total(), profiles))
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::models::anuncio::AnuncioPatch;

    fn perfil(nome: &str, estado: &str) -> Anuncio {
        Anuncio::from_patch(
            Uuid::new_v4(),
            None,
            AnuncioPatch { nome: Some(nome.into()), estado: Some(estado.into()), ..AnuncioPatch::default() },
            Utc::now(),
        )
        .expect("perfil válido")
    }

    #[tokio::test]
    async fn ready_waits_for_publish() {
        let store = ShowcaseStore::new();
        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.ready(Duration::from_secs(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.publish(vec![perfil("a", "SP")]);

        let snapshot = waiter.await.expect("task").expect("vitrine pronta");
        assert_eq!(snapshot.profiles.len(), 1);
    }

    #[tokio::test]
    async fn ready_times_out_without_data() {
        let store = ShowcaseStore::new();
        let result = store.ready(Duration::from_millis(30)).await;
        assert!(matches!(result, Err(AppError::ShowcaseNotReady)));
    }

    #[test]
    fn snapshot_counts_states_after_normalization() {
        let store = ShowcaseStore::new();
        let snapshot = store.publish(vec![
            perfil("a", "SP"),
            perfil("b", "São Paulo"),
            perfil("c", "rj"),
            perfil("d", "desconhecido"),
        ]);
        assert_eq!(
            snapshot.counts,
            vec![
                EstadoCount { sigla: "SP".into(), nome: "São Paulo".into(), total: 2 },
                EstadoCount { sigla: "RJ".into(), nome: "Rio de Janeiro".into(), total: 1 },
            ]
        );
    }

    #[test]
    fn home_page_ignores_state_filter() {
        let snapshot = Snapshot::build(vec![perfil("a", "SP"), perfil("b", "RJ")]);
        let query = VitrineQuery {
            estado: Some("SP".into()),
            pagina: Some("home".into()),
            view: Some("count".into()),
            ..Default::default()
        };
        let view = build_view(&snapshot, &query, &mut StdRng::seed_from_u64(1)).expect("view");
        assert!(matches!(view, VitrineView::Count { exibidos: 2, total: 2, estado: None }));
    }

    #[test]
    fn listing_page_applies_state_filter_in_compact_view() {
        let snapshot = Snapshot::build(vec![perfil("a", "SP"), perfil("b", "RJ"), perfil("c", "sp")]);
        let query = VitrineQuery {
            estado: Some("sp".into()),
            view: Some("compact".into()),
            ..Default::default()
        };
        match build_view(&snapshot, &query, &mut StdRng::seed_from_u64(2)).expect("view") {
            VitrineView::Compact { estado, total, exibidos, anuncios } => {
                assert_eq!(estado.as_deref(), Some("SP"));
                assert_eq!(total, 3);
                assert_eq!(exibidos, 2);
                assert!(anuncios.iter().all(|a| a.estado.as_deref() == Some("SP")));
            }
            other => panic!("visualização inesperada: {:?}", other),
        }
    }

    #[test]
    fn blank_state_and_city_mean_no_filter() {
        let snapshot = Snapshot::build(vec![perfil("a", "SP"), perfil("b", "RJ")]);
        let query = VitrineQuery {
            estado: Some("".into()),
            cidade: Some("  ".into()),
            view: Some("count".into()),
            ..Default::default()
        };
        match build_view(&snapshot, &query, &mut StdRng::seed_from_u64(4)).expect("view") {
            VitrineView::Count { estado, total, exibidos } => {
                assert_eq!(estado, None);
                assert_eq!(total, 2);
                assert_eq!(exibidos, 2);
            }
            other => panic!("visualização inesperada: {:?}", other),
        }
    }

    #[test]
    fn cards_never_carry_identity_documents() {
        let mut com_documentos = perfil("a", "SP");
        com_documentos.documentos.frente_url = Some("/api/image/rg.jpg".into());
        com_documentos.documentos.selfie_url = Some("/api/image/selfie.jpg".into());
        let snapshot = Snapshot::build(vec![com_documentos]);

        let view = build_view(&snapshot, &VitrineQuery::default(), &mut StdRng::seed_from_u64(5)).expect("view");
        let json = serde_json::to_value(&view).expect("json");
        assert_eq!(json["anuncios"].as_array().map(Vec::len), Some(1));
        assert!(json["anuncios"][0].get("documentos").is_none());
    }

    #[test]
    fn unknown_view_is_rejected() {
        assert!(RenderStrategy::parse(Some("carousel")).is_err());
        assert_eq!(RenderStrategy::parse(None).expect("padrão"), RenderStrategy::Cards);
    }
}
