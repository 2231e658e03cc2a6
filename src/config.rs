// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use sqlx::postgres::PgPoolOptions;

use crate::{
    db::{
        AnuncioRepository, MemoryAnuncioRepository, MemoryUserRepository, PgAnuncioRepository, PgUserRepository,
        UserRepository,
    },
    location::{
        geoip::{GeoProvider, GeoProviderKind, LocationService},
        vitrine::ShowcaseStore,
    },
    middleware::rate_limit::UploadRateLimiter,
    services::{
        admin_service::AdminService, anuncio_service::AnuncioService, auth::AuthService,
        upload_service::UploadService, wizard_service::WizardService,
    },
    storage::FileStorage,
};

const DEV_JWT_SECRET: &str = "dev-secret-troque-em-producao";
const WIZARD_SESSION_TTL: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => bail!("ambiente desconhecido '{}'", other),
        }
    }
}

// Configurações lidas do ambiente (.env opcional)
#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub upload_rate_limit: u32,
    pub upload_rate_window: Duration,
    pub trust_proxy_headers: bool,
    pub geoip_primary_url: String,
    pub geoip_fallback_url: String,
    pub geoip_timeout: Duration,
    pub showcase_refresh: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            port: 3000,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_ttl_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 10 * 1024 * 1024,
            upload_rate_limit: 30,
            upload_rate_window: Duration::from_secs(600),
            trust_proxy_headers: false,
            geoip_primary_url: "https://ipapi.co".to_string(),
            geoip_fallback_url: "http://ip-api.com".to_string(),
            geoip_timeout: Duration::from_secs(5),
            showcase_refresh: Duration::from_secs(60),
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta as configurações a partir de uma função de busca (env, mapa de teste...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let environment = parse_or(&var, "ENVIRONMENT", defaults.environment)?;
        let database_url = var("DATABASE_URL");
        let jwt_secret = var("JWT_SECRET");

        if environment == Environment::Production {
            if database_url.is_none() {
                bail!("DATABASE_URL deve ser definida em produção");
            }
            if jwt_secret.is_none() {
                bail!("JWT_SECRET deve ser definido em produção");
            }
        }

        Ok(Self {
            environment,
            port: parse_or(&var, "PORT", defaults.port)?,
            database_url,
            jwt_secret: jwt_secret.unwrap_or(defaults.jwt_secret),
            jwt_ttl_hours: parse_or(&var, "JWT_TTL_HOURS", defaults.jwt_ttl_hours)?,
            bcrypt_cost: parse_or(&var, "BCRYPT_COST", defaults.bcrypt_cost)?,
            upload_dir: var("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            max_upload_bytes: parse_or(&var, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            upload_rate_limit: parse_or(&var, "UPLOAD_RATE_LIMIT", defaults.upload_rate_limit)?,
            upload_rate_window: Duration::from_secs(parse_or(&var, "UPLOAD_RATE_WINDOW_SECS", 600)?),
            trust_proxy_headers: parse_or(&var, "TRUSTED_PROXY_HEADERS", defaults.trust_proxy_headers)?,
            geoip_primary_url: var("GEOIP_PRIMARY_URL").unwrap_or(defaults.geoip_primary_url),
            geoip_fallback_url: var("GEOIP_FALLBACK_URL").unwrap_or(defaults.geoip_fallback_url),
            geoip_timeout: Duration::from_secs(parse_or(&var, "GEOIP_TIMEOUT_SECS", 5)?),
            showcase_refresh: Duration::from_secs(parse_or(&var, "SHOWCASE_REFRESH_SECS", 60)?),
        })
    }

    pub fn geo_providers(&self) -> Vec<GeoProvider> {
        vec![
            GeoProvider::new(GeoProviderKind::IpapiCo, &self.geoip_primary_url),
            GeoProvider::new(GeoProviderKind::IpApiCom, &self.geoip_fallback_url),
        ]
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Valor inválido para {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub auth_service: AuthService,
    pub anuncio_service: AnuncioService,
    pub admin_service: AdminService,
    pub upload_service: UploadService,
    pub location_service: LocationService,
    pub wizard_service: WizardService,
    pub showcase: ShowcaseStore,
    pub upload_limiter: UploadRateLimiter,
    pub storage_backend: &'static str,
}

impl AppState {
    /// Conecta ao PostgreSQL (e roda as migrações) ou, sem DATABASE_URL, usa memória.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let (anuncio_repo, user_repo, backend): (Arc<dyn AnuncioRepository>, Arc<dyn UserRepository>, &'static str) =
            match &settings.database_url {
                Some(database_url) => {
                    let db_pool = PgPoolOptions::new()
                        .max_connections(5)
                        .acquire_timeout(Duration::from_secs(3))
                        .connect(database_url)
                        .await
                        .context("Falha ao conectar ao banco de dados")?;
                    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                    sqlx::migrate!()
                        .run(&db_pool)
                        .await
                        .context("Falha ao rodar as migrações do banco de dados")?;
                    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                    let anuncio_repo: Arc<dyn AnuncioRepository> = Arc::new(PgAnuncioRepository::new(db_pool.clone()));
                    let user_repo: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(db_pool));
                    (anuncio_repo, user_repo, "postgres")
                }
                None => {
                    tracing::warn!("⚠️ DATABASE_URL não definida: usando armazenamento em memória (dados se perdem ao reiniciar)");
                    let anuncio_repo: Arc<dyn AnuncioRepository> = Arc::new(MemoryAnuncioRepository::new());
                    let user_repo: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());
                    (anuncio_repo, user_repo, "memory")
                }
            };

        let mut state = Self::from_repositories(settings, anuncio_repo, user_repo)?;
        state.storage_backend = backend;
        Ok(state)
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_repositories(
        settings: Settings,
        anuncio_repo: Arc<dyn AnuncioRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> anyhow::Result<Self> {
        let showcase = ShowcaseStore::new();

        let auth_service = AuthService::new(
            user_repo.clone(),
            settings.jwt_secret.clone(),
            chrono::Duration::hours(settings.jwt_ttl_hours),
            settings.bcrypt_cost,
        );
        let anuncio_service = AnuncioService::new(anuncio_repo.clone(), showcase.clone());
        let admin_service = AdminService::new(anuncio_repo, user_repo);
        let upload_service = UploadService::new(FileStorage::new(&settings.upload_dir), settings.max_upload_bytes);
        let location_service = LocationService::new(settings.geo_providers(), settings.geoip_timeout)
            .context("Falha ao criar o cliente HTTP de geolocalização")?;
        let wizard_service = WizardService::new(auth_service.clone(), anuncio_service.clone(), WIZARD_SESSION_TTL);
        let upload_limiter = UploadRateLimiter::new(settings.upload_rate_limit, settings.upload_rate_window);

        Ok(Self {
            settings: Arc::new(settings),
            auth_service,
            anuncio_service,
            admin_service,
            upload_service,
            location_service,
            wizard_service,
            showcase,
            upload_limiter,
            storage_backend: "memory",
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_in_development() {
        let settings = Settings::from_lookup(lookup(&[])).expect("settings");
        assert_eq!(settings.environment, Environment::Development);
        assert_eq!(settings.port, 3000);
        assert!(settings.database_url.is_none());
        assert_eq!(settings.upload_rate_window, Duration::from_secs(600));
        assert!(!settings.trust_proxy_headers);
    }

    #[test]
    fn invalid_number_names_the_variable() {
        let err = Settings::from_lookup(lookup(&[("PORT", "abc")])).expect_err("porta inválida");
        assert!(format!("{:#}", err).contains("PORT"));
    }

    #[test]
    fn production_requires_database_and_secret() {
        let err = Settings::from_lookup(lookup(&[("ENVIRONMENT", "production")])).expect_err("sem banco");
        assert!(err.to_string().contains("DATABASE_URL"));

        let settings = Settings::from_lookup(lookup(&[
            ("ENVIRONMENT", "production"),
            ("DATABASE_URL", "postgres://localhost/classificados"),
            ("JWT_SECRET", "segredo"),
        ]))
        .expect("produção válida");
        assert_eq!(settings.jwt_secret, "segredo");
    }
}
