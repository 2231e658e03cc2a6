pub mod admin_service;
pub mod anuncio_service;
pub mod auth;
pub mod seed;
pub mod upload_audit;
pub mod upload_service;
pub mod wizard_service;
