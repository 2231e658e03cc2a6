// Helpers compartilhados pelos testes de integração.
#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use classificados::{
    config::{AppState, Settings},
    db::{MemoryAnuncioRepository, MemoryUserRepository},
    models::{
        anuncio::{Anuncio, AnuncioPatch, AnuncioStatus, ModeracaoPayload},
        auth::UserRole,
    },
    routes::build_router,
};

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    // Mantém o diretório de uploads vivo durante o teste
    _dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub bytes: Vec<u8>,
}

pub fn test_settings(dir: &TempDir) -> Settings {
    Settings {
        jwt_secret: "segredo-de-teste".to_string(),
        bcrypt_cost: 4,
        upload_dir: dir.path().join("uploads"),
        max_upload_bytes: 1024,
        // Nada escuta na porta 9: geolocalização falha rápido se o teste não usar mock
        geoip_primary_url: "http://127.0.0.1:9".to_string(),
        geoip_fallback_url: "http://127.0.0.1:9".to_string(),
        geoip_timeout: Duration::from_secs(1),
        ..Settings::default()
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(|_| {})
}

pub fn spawn_app_with(customize: impl FnOnce(&mut Settings)) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut settings = test_settings(&dir);
    customize(&mut settings);

    let state = AppState::from_repositories(
        settings,
        Arc::new(MemoryAnuncioRepository::new()),
        Arc::new(MemoryUserRepository::new()),
    )
    .expect("estado da aplicação");
    let router = build_router(state.clone());
    TestApp { state, router, _dir: dir }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("resposta");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("corpo").to_vec();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, headers, body, bytes }
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        self.send(request(method, uri, token, body)).await
    }

    /// Registra pela API e devolve (token, id).
    pub async fn register(&self, email: &str, password: &str) -> (String, String) {
        let response = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::json!({ "email": email, "password": password, "nome": "Pessoa Teste" })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "registro falhou: {}", response.body);
        let token = response.body["data"]["token"].as_str().expect("token").to_string();
        let id = response.body["data"]["user"]["id"].as_str().expect("id").to_string();
        (token, id)
    }

    /// Admin não pode ser criado pela API; vai direto no serviço.
    pub async fn admin_token(&self) -> String {
        let admin = self
            .state
            .auth_service
            .create_user_with_role("admin@exemplo.com", "admin123", Some("Admin".into()), UserRole::Admin)
            .await
            .expect("admin");
        self.state.auth_service.create_token(&admin).expect("token")
    }

    /// Cria um anúncio já aprovado (ativo).
    pub async fn active_listing(&self, nome: &str, estado: &str, cidade: Option<&str>) -> Anuncio {
        let anuncio = self
            .state
            .anuncio_service
            .create(
                None,
                AnuncioPatch {
                    nome: Some(nome.to_string()),
                    estado: Some(estado.to_string()),
                    cidade: cidade.map(str::to_string),
                    ..AnuncioPatch::default()
                },
            )
            .await
            .expect("anúncio");
        self.state
            .anuncio_service
            .moderate(anuncio.id, ModeracaoPayload { status: Some(AnuncioStatus::Ativo), verificado: None })
            .await
            .expect("moderação")
    }

    pub async fn reload_showcase(&self) {
        self.state
            .showcase
            .reload(self.state.anuncio_service.repo().as_ref())
            .await
            .expect("recarga da vitrine");
    }
}
