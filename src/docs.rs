// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::location;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,

        // --- Users ---
        handlers::users::get_me,
        handlers::users::get_preferences,
        handlers::users::update_preferences,

        // --- Anúncios ---
        handlers::anuncios::list_anuncios,
        handlers::anuncios::get_anuncio,
        handlers::anuncios::create_anuncio,
        handlers::anuncios::update_anuncio,
        handlers::anuncios::delete_anuncio,

        // --- Vitrine / Localização ---
        handlers::vitrine::get_vitrine,
        handlers::vitrine::get_estados,
        handlers::location::get_location,

        // --- Uploads ---
        handlers::uploads::upload,
        handlers::uploads::get_image,

        // --- Admin ---
        handlers::admin::get_stats,
        handlers::admin::list_anuncios,
        handlers::admin::moderate_anuncio,
        handlers::admin::list_users,
        handlers::admin::set_user_status,

        // --- Cadastro ---
        handlers::cadastro::start,
        handlers::cadastro::get_session,
        handlers::cadastro::submit_screen,
        handlers::cadastro::back,
        handlers::cadastro::finish,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::UserStatus,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::UserStatusPayload,

            // --- Anúncios ---
            models::anuncio::AnuncioStatus,
            models::anuncio::Documentos,
            models::anuncio::Anuncio,
            models::anuncio::AnuncioPayload,
            models::anuncio::ModeracaoPayload,

            // --- Localização ---
            models::location::LocationResponse,
            models::location::LocalizacaoEscolhida,
            models::location::LocationPreferences,
            location::vitrine::AnuncioResumo,
            location::vitrine::VitrineView,

            // --- Uploads ---
            models::upload::UploadPayload,
            models::upload::UploadedFile,

            // --- Admin ---
            models::admin::AdminStats,
            models::admin::EstadoCount,

            // --- Cadastro ---
            services::wizard_service::WizardView,
            handlers::cadastro::CadastroConcluido,
        )
    ),
    tags(
        (name = "Health", description = "Status do servidor"),
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Preferências"),
        (name = "Anúncios", description = "CRUD de Anúncios"),
        (name = "Vitrine", description = "Anúncios ativos por localização"),
        (name = "Localização", description = "Geolocalização por IP"),
        (name = "Uploads", description = "Envio e leitura de arquivos"),
        (name = "Admin", description = "Painel de Moderação"),
        (name = "Cadastro", description = "Assistente de cadastro de anunciantes")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
