pub mod estados;
pub mod filtro;
pub mod geoip;
pub mod vitrine;
