pub mod admin;
pub mod anuncio;
pub mod auth;
pub mod location;
pub mod upload;
