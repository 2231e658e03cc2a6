pub mod admin;
pub mod anuncios;
pub mod auth;
pub mod cadastro;
pub mod health;
pub mod location;
pub mod uploads;
pub mod users;
pub mod vitrine;
