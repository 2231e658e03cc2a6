// src/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{auth::auth_guard, rate_limit::upload_rate_limit},
};

pub fn build_router(app_state: AppState) -> Router {
    let require_auth = || axum_middleware::from_fn_with_state(app_state.clone(), auth_guard);

    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout));

    // Define as rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::users::get_me))
        .route(
            "/me/preferencias",
            get(handlers::users::get_preferences).put(handlers::users::update_preferences),
        )
        .layer(require_auth());

    // Leitura pública; escrita exige login
    let anuncio_routes = Router::new()
        .route(
            "/",
            get(handlers::anuncios::list_anuncios)
                .merge(post(handlers::anuncios::create_anuncio).route_layer(require_auth())),
        )
        .route(
            "/{id}",
            get(handlers::anuncios::get_anuncio).merge(
                put(handlers::anuncios::update_anuncio)
                    .delete(handlers::anuncios::delete_anuncio)
                    .route_layer(require_auth()),
            ),
        );

    let vitrine_routes = Router::new()
        .route("/", get(handlers::vitrine::get_vitrine))
        .route("/estados", get(handlers::vitrine::get_estados));

    // O corpo vem em base64 (~4/3 do arquivo)
    let upload_body_limit = app_state.settings.max_upload_bytes / 3 * 4 + 64 * 1024;
    let upload_route = post(handlers::uploads::upload)
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), upload_rate_limit))
        .layer(DefaultBodyLimit::max(upload_body_limit));

    let admin_routes = Router::new()
        .route("/stats", get(handlers::admin::get_stats))
        .route("/anuncios", get(handlers::admin::list_anuncios))
        .route("/anuncios/{id}/moderacao", patch(handlers::admin::moderate_anuncio))
        .route("/usuarios", get(handlers::admin::list_users))
        .route("/usuarios/{id}/status", patch(handlers::admin::set_user_status))
        .layer(require_auth());

    let cadastro_routes = Router::new()
        .route("/", post(handlers::cadastro::start))
        .route("/{id}", get(handlers::cadastro::get_session))
        .route("/{id}/telas/{tela}", put(handlers::cadastro::submit_screen))
        .route("/{id}/voltar", post(handlers::cadastro::back))
        .route("/{id}/concluir", post(handlers::cadastro::finish));

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(handlers::health::health))
        .route("/api/location", get(handlers::location::get_location))
        .route("/api/upload", upload_route)
        .route("/api/image/{filename}", get(handlers::uploads::get_image))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/anuncios", anuncio_routes)
        .nest("/api/vitrine", vitrine_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/cadastro", cadastro_routes)
        .with_state(app_state)
}
