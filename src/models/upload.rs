// src/models/upload.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// Corpo de POST /api/upload: arquivo em base64 (com ou sem prefixo "data:")
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
    #[validate(length(min = 1, message = "O arquivo é obrigatório."))]
    #[serde(alias = "base64", alias = "data")]
    pub file: String,

    #[validate(length(min = 1, max = 200, message = "O nome do arquivo deve ter entre 1 e 200 caracteres."))]
    #[serde(alias = "fileName", alias = "name")]
    #[schema(example = "foto-capa.jpg")]
    pub filename: String,

    // Campo do anúncio ao qual o arquivo se destina (ex: "foto_capa", "galeria_3")
    pub field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    #[schema(example = "/api/image/3f2a...-foto-capa.jpg")]
    pub url: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub field: Option<String>,
}
