// src/storage.rs

use std::path::{Path, PathBuf};

use crate::common::error::AppError;

/// Prefixo público das URLs de arquivos enviados.
pub const PUBLIC_PREFIX: &str = "/api/image/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    pub path: PathBuf,
}

// Armazenamento de arquivos em disco (um diretório plano).
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub async fn save(&self, name: &str, bytes: &[u8]) -> Result<StoredFile, AppError> {
        let path = self.path_for(name)?;
        self.ensure_dir().await?;
        tokio::fs::write(&path, bytes).await?;
        Ok(StoredFile { name: name.to_string(), size: bytes.len() as u64, path })
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>, AppError> {
        let path = self.path_for(name).map_err(|_| AppError::FileNotFound)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::FileNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Lista todos os arquivos do diretório (sem recursão).
    pub async fn list(&self) -> Result<Vec<StoredFile>, AppError> {
        let mut files = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            files.push(StoredFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                path: entry.path(),
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, AppError> {
        if !is_safe_name(name) {
            return Err(AppError::BadRequest("Nome de arquivo inválido.".to_string()));
        }
        Ok(self.root.join(name))
    }
}

/// Nome simples, sem separadores de diretório nem "..".
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}

/// Reduz um nome enviado pelo cliente a [a-z0-9._-].
pub fn sanitize_filename(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let mut out = String::with_capacity(base.len());
    for ch in crate::common::text::fold_text(base).chars() {
        match ch {
            'a'..='z' | '0'..='9' | '.' | '-' | '_' => out.push(ch),
            ' ' => out.push('-'),
            _ => {}
        }
    }
    let trimmed = out.trim_matches(|c| c == '.' || c == '-').to_string();
    if trimmed.is_empty() { "arquivo".to_string() } else { trimmed }
}

/// Extensão em minúsculas ("foto.JPG" -> "jpg").
pub fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_lowercase())
}

pub fn content_type_for(name: &str) -> &'static str {
    match extension(name).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Extrai o nome do arquivo de uma URL pública ("/api/image/x.jpg", ou absoluta).
pub fn name_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let idx = path.find(PUBLIC_PREFIX)?;
    let name = &path[idx + PUBLIC_PREFIX.len()..];
    is_safe_name(name).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_names_reject_traversal() {
        assert!(is_safe_name("foto.jpg"));
        assert!(!is_safe_name("../etc/passwd"));
        assert!(!is_safe_name("a/b.jpg"));
        assert!(!is_safe_name(".env"));
        assert!(!is_safe_name(""));
    }

    #[test]
    fn sanitize_keeps_a_readable_slug() {
        assert_eq!(sanitize_filename("Foto de Capa.JPG"), "foto-de-capa.jpg");
        assert_eq!(sanitize_filename("C:\\fotos\\ação.png"), "acao.png");
        assert_eq!(sanitize_filename("..."), "arquivo");
    }

    #[test]
    fn extension_and_content_type() {
        assert_eq!(extension("a.JPEG").as_deref(), Some("jpeg"));
        assert_eq!(extension("semextensao"), None);
        assert_eq!(extension(".htaccess"), None);
        assert_eq!(content_type_for("x.webp"), "image/webp");
        assert_eq!(content_type_for("x.bin"), "application/octet-stream");
    }

    #[test]
    fn name_from_url_handles_relative_and_absolute() {
        assert_eq!(name_from_url("/api/image/abc.jpg"), Some("abc.jpg"));
        assert_eq!(name_from_url("https://site.com.br/api/image/abc.jpg?v=2"), Some("abc.jpg"));
        assert_eq!(name_from_url("https://placehold.co/600x400"), None);
    }

    #[tokio::test]
    async fn save_read_and_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::new(dir.path().join("uploads"));
        storage.save("a.jpg", b"abc").await.expect("save");
        assert_eq!(storage.read("a.jpg").await.expect("read"), b"abc");
        assert!(matches!(storage.read("b.jpg").await, Err(AppError::FileNotFound)));
        let files = storage.list().await.expect("list");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, 3);
    }
}
