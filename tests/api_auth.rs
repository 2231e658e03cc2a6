mod support;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;

use support::spawn_app;

#[tokio::test]
async fn register_sets_cookie_and_rejects_duplicate_email() {
    let app = spawn_app();

    let response = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "Maria@Exemplo.com", "password": "senha123", "name": "Maria" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["user"]["email"], "maria@exemplo.com");
    assert!(response.body["data"]["user"].get("passwordHash").is_none());
    let cookie = response.headers.get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let duplicate = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "maria@exemplo.com", "password": "outra123" })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["success"], false);
}

#[tokio::test]
async fn register_validates_payload() {
    let app = spawn_app();
    let response = app
        .call(Method::POST, "/api/auth/register", None, Some(json!({ "email": "invalido", "password": "123" })))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["details"]["email"].is_array());
    assert!(response.body["details"]["password"].is_array());
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = spawn_app();
    app.register("joao@exemplo.com", "senha123").await;

    let wrong = app
        .call(Method::POST, "/api/auth/login", None, Some(json!({ "email": "joao@exemplo.com", "password": "errada" })))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["success"], false);

    let unknown = app
        .call(Method::POST, "/api/auth/login", None, Some(json!({ "email": "nao@existe.com", "password": "senha123" })))
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let ok = app
        .call(Method::POST, "/api/auth/login", None, Some(json!({ "email": "joao@exemplo.com", "password": "senha123" })))
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn me_accepts_bearer_or_cookie() {
    let app = spawn_app();
    let (token, id) = app.register("ana@exemplo.com", "senha123").await;

    let bearer = app.call(Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(bearer.status, StatusCode::OK);
    assert_eq!(bearer.body["data"]["id"], id.as_str());

    let cookie = app
        .send(
            Request::builder()
                .uri("/api/users/me")
                .header(header::COOKIE, format!("token={}", token))
                .body(Body::empty())
                .expect("request"),
        )
        .await;
    assert_eq!(cookie.status, StatusCode::OK);
    assert_eq!(cookie.body["data"]["email"], "ana@exemplo.com");
}

#[tokio::test]
async fn missing_token_is_401_for_api_and_redirect_for_browser() {
    let app = spawn_app();

    let api = app.call(Method::GET, "/api/users/me", None, None).await;
    assert_eq!(api.status, StatusCode::UNAUTHORIZED);
    assert_eq!(api.body["success"], false);

    let browser = app
        .send(
            Request::builder()
                .uri("/api/users/me")
                .header(header::ACCEPT, "text/html,application/xhtml+xml")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
    assert!(browser.status.is_redirection());
    assert_eq!(browser.headers.get(header::LOCATION).and_then(|v| v.to_str().ok()), Some("/login"));

    let garbage = app.call(Method::GET, "/api/users/me", Some("nao-e-um-jwt"), None).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn preferences_are_persisted_with_normalized_states() {
    let app = spawn_app();
    let (token, _) = app.register("pref@exemplo.com", "senha123").await;

    let saved = app
        .call(
            Method::PUT,
            "/api/users/me/preferencias",
            Some(&token),
            Some(json!({
                "filtroEstado": "São Paulo",
                "localizacaoEscolhida": { "estado": "distrito federal", "cidade": null },
                "cidadeSelecionada": "Campinas"
            })),
        )
        .await;
    assert_eq!(saved.status, StatusCode::OK);
    assert_eq!(saved.body["data"]["filtroEstado"], "SP");
    assert_eq!(saved.body["data"]["localizacaoEscolhida"]["estado"], "DF");

    let loaded = app.call(Method::GET, "/api/users/me/preferencias", Some(&token), None).await;
    assert_eq!(loaded.body["data"]["filtroEstado"], "SP");
    assert_eq!(loaded.body["data"]["cidadeSelecionada"], "Campinas");

    let invalid = app
        .call(Method::PUT, "/api/users/me/preferencias", Some(&token), Some(json!({ "filtroEstado": "Atlântida" })))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_expires_the_cookie() {
    let app = spawn_app();
    let response = app.call(Method::POST, "/api/auth/logout", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.headers.get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert!(cookie.starts_with("token="));
}
