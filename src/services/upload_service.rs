// src/services/upload_service.rs

use base64::{engine::general_purpose::STANDARD, Engine as _};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::upload::{UploadPayload, UploadedFile},
    storage::{content_type_for, extension, sanitize_filename, FileStorage, PUBLIC_PREFIX},
};

/// Extensões aceitas no upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "mp4", "webm", "pdf"];

/// Extensões de script/executável: nunca aceitas, nem "escondidas" antes da extensão final.
pub const SUSPICIOUS_EXTENSIONS: &[&str] = &[
    "php", "phtml", "php5", "phar", "exe", "bat", "cmd", "sh", "js", "html", "htm", "svg", "jsp", "asp", "aspx", "cgi",
    "pl", "py",
];

#[derive(Clone)]
pub struct UploadService {
    storage: FileStorage,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(storage: FileStorage, max_bytes: usize) -> Self {
        Self { storage, max_bytes }
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    pub async fn upload(&self, payload: UploadPayload) -> Result<UploadedFile, AppError> {
        let safe_name = sanitize_filename(&payload.filename);
        check_extension(&safe_name)?;

        // Aceita "data:image/png;base64,...." ou base64 puro
        let encoded = match payload.file.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => payload.file.as_str(),
        };

        // Recusa antes de decodificar se o texto já passa do limite
        if encoded.len() / 4 * 3 > self.max_bytes + 3 {
            return Err(AppError::PayloadTooLarge(self.max_bytes));
        }

        let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|_| AppError::BadRequest("Conteúdo base64 inválido.".to_string()))?;

        if bytes.is_empty() {
            return Err(AppError::BadRequest("O arquivo está vazio.".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge(self.max_bytes));
        }

        let stored_name = format!("{}-{}", Uuid::new_v4().simple(), safe_name);
        let stored = self.storage.save(&stored_name, &bytes).await?;

        tracing::info!("📤 Arquivo salvo: {} ({} bytes)", stored.name, stored.size);

        Ok(UploadedFile {
            url: format!("{}{}", PUBLIC_PREFIX, stored.name),
            content_type: content_type_for(&stored.name).to_string(),
            filename: stored.name,
            size: stored.size,
            field: payload.field,
        })
    }

    pub async fn read(&self, filename: &str) -> Result<(Vec<u8>, &'static str), AppError> {
        let bytes = self.storage.read(filename).await?;
        Ok((bytes, content_type_for(filename)))
    }
}

/// Rejeita extensões fora da lista e nomes como "foto.php.jpg".
pub fn check_extension(name: &str) -> Result<(), AppError> {
    let ext = extension(name).ok_or_else(|| AppError::UnsupportedFileType("(sem extensão)".to_string()))?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::UnsupportedFileType(ext));
    }
    if let Some(hidden) = hidden_suspicious_extension(name) {
        return Err(AppError::UnsupportedFileType(hidden));
    }
    Ok(())
}

/// Procura extensões perigosas em qualquer segmento do nome, inclusive o último.
pub fn hidden_suspicious_extension(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    lower
        .split('.')
        .skip(1)
        .find(|segment| SUSPICIOUS_EXTENSIONS.contains(segment))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(file: &str, filename: &str) -> UploadPayload {
        UploadPayload { file: file.to_string(), filename: filename.to_string(), field: Some("foto_capa".into()) }
    }

    fn service(dir: &tempfile::TempDir, max_bytes: usize) -> UploadService {
        UploadService::new(FileStorage::new(dir.path()), max_bytes)
    }

    #[tokio::test]
    async fn upload_accepts_data_url_prefix() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = service(&dir, 1024);
        let encoded = STANDARD.encode(b"imagem");
        let uploaded = svc
            .upload(payload(&format!("data:image/png;base64,{}", encoded), "Minha Foto.PNG"))
            .await
            .expect("upload");

        assert!(uploaded.url.starts_with("/api/image/"));
        assert!(uploaded.filename.ends_with("-minha-foto.png"));
        assert_eq!(uploaded.content_type, "image/png");
        assert_eq!(uploaded.size, 6);
        let (bytes, _) = svc.read(&uploaded.filename).await.expect("read");
        assert_eq!(bytes, b"imagem");
    }

    #[tokio::test]
    async fn upload_rejects_scripts_and_double_extensions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = service(&dir, 1024);
        let encoded = STANDARD.encode(b"<?php ?>");
        assert!(matches!(
            svc.upload(payload(&encoded, "shell.php")).await,
            Err(AppError::UnsupportedFileType(_))
        ));
        assert!(matches!(
            svc.upload(payload(&encoded, "foto.php.jpg")).await,
            Err(AppError::UnsupportedFileType(_))
        ));
    }

    #[tokio::test]
    async fn upload_enforces_size_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = service(&dir, 8);
        let encoded = STANDARD.encode([0u8; 64]);
        assert!(matches!(
            svc.upload(payload(&encoded, "grande.jpg")).await,
            Err(AppError::PayloadTooLarge(8))
        ));
    }

    #[tokio::test]
    async fn upload_rejects_invalid_base64() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = service(&dir, 1024);
        assert!(matches!(
            svc.upload(payload("não é base64!!", "x.jpg")).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
