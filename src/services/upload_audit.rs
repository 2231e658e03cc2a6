// src/services/upload_audit.rs

// Auditoria do diretório de uploads contra os anúncios cadastrados.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::Serialize;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AnuncioRepository,
    models::anuncio::AnuncioFilter,
    services::upload_service::{hidden_suspicious_extension, ALLOWED_EXTENSIONS},
    storage::{extension, name_from_url, FileStorage},
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub hash: String,
    pub tamanho: u64,
    pub arquivos: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArquivoGrande {
    pub nome: String,
    pub tamanho: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReferenciaQuebrada {
    pub anuncio_id: Uuid,
    pub url: String,
}

#[derive(Debug, Default, Serialize)]
pub struct AuditReport {
    pub total_arquivos: usize,
    pub total_bytes: u64,
    pub duplicados: Vec<DuplicateGroup>,
    pub grandes: Vec<ArquivoGrande>,
    pub suspeitos: Vec<String>,
    pub orfaos: Vec<String>,
    pub referencias_quebradas: Vec<ReferenciaQuebrada>,
}

impl AuditReport {
    pub fn has_findings(&self) -> bool {
        !(self.duplicados.is_empty()
            && self.grandes.is_empty()
            && self.suspeitos.is_empty()
            && self.orfaos.is_empty()
            && self.referencias_quebradas.is_empty())
    }

    /// Bytes que sobrariam livres mantendo só uma cópia de cada duplicado.
    pub fn bytes_duplicados(&self) -> u64 {
        self.duplicados
            .iter()
            .map(|g| g.tamanho * (g.arquivos.len().saturating_sub(1) as u64))
            .sum()
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Arquivos: {} ({} bytes)", self.total_arquivos, self.total_bytes)?;

        writeln!(f, "Duplicados: {} grupos, {} bytes recuperáveis", self.duplicados.len(), self.bytes_duplicados())?;
        for grupo in &self.duplicados {
            writeln!(f, "  {} [{} bytes]: {}", &grupo.hash[..12], grupo.tamanho, grupo.arquivos.join(", "))?;
        }

        writeln!(f, "Acima do limite: {}", self.grandes.len())?;
        for arquivo in &self.grandes {
            writeln!(f, "  {} ({} bytes)", arquivo.nome, arquivo.tamanho)?;
        }

        writeln!(f, "Suspeitos: {}", self.suspeitos.len())?;
        for nome in &self.suspeitos {
            writeln!(f, "  {}", nome)?;
        }

        writeln!(f, "Órfãos (sem anúncio): {}", self.orfaos.len())?;
        for nome in &self.orfaos {
            writeln!(f, "  {}", nome)?;
        }

        writeln!(f, "Referências quebradas: {}", self.referencias_quebradas.len())?;
        for quebrada in &self.referencias_quebradas {
            writeln!(f, "  {} -> {}", quebrada.anuncio_id, quebrada.url)?;
        }
        Ok(())
    }
}

pub async fn audit_uploads(
    storage: &FileStorage,
    repo: &dyn AnuncioRepository,
    max_bytes: u64,
) -> Result<AuditReport, AppError> {
    let files = storage.list().await?;
    let mut report = AuditReport {
        total_arquivos: files.len(),
        total_bytes: files.iter().map(|f| f.size).sum(),
        ..AuditReport::default()
    };

    let mut by_hash: BTreeMap<String, (u64, Vec<String>)> = BTreeMap::new();
    for file in &files {
        let bytes = tokio::fs::read(&file.path).await?;
        let hash = blake3::hash(&bytes).to_hex().to_string();
        by_hash.entry(hash).or_insert_with(|| (file.size, Vec::new())).1.push(file.name.clone());

        if file.size > max_bytes {
            report.grandes.push(ArquivoGrande { nome: file.name.clone(), tamanho: file.size });
        }

        let allowed = extension(&file.name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
        if !allowed || hidden_suspicious_extension(&file.name).is_some() {
            report.suspeitos.push(file.name.clone());
        }
    }

    report.duplicados = by_hash
        .into_iter()
        .filter(|(_, (_, nomes))| nomes.len() > 1)
        .map(|(hash, (tamanho, arquivos))| DuplicateGroup { hash, tamanho, arquivos })
        .collect();

    let on_disk: BTreeSet<&str> = files.iter().map(|f| f.name.as_str()).collect();
    let mut referenced: BTreeSet<String> = BTreeSet::new();

    for anuncio in repo.list(&AnuncioFilter::default()).await? {
        for url in anuncio.file_urls() {
            // URLs externas (CDN, placeholder) não são nossas
            let Some(name) = name_from_url(url) else { continue };
            if !on_disk.contains(name) {
                report.referencias_quebradas.push(ReferenciaQuebrada { anuncio_id: anuncio.id, url: url.to_string() });
            }
            referenced.insert(name.to_string());
        }
    }

    report.orfaos = files
        .iter()
        .filter(|f| !referenced.contains(&f.name))
        .map(|f| f.name.clone())
        .collect();

    tracing::info!(
        "🔎 Auditoria: {} arquivos, {} duplicados, {} órfãos, {} referências quebradas",
        report.total_arquivos,
        report.duplicados.len(),
        report.orfaos.len(),
        report.referencias_quebradas.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryAnuncioRepository,
        models::anuncio::{Anuncio, AnuncioPatch},
    };
    use chrono::Utc;

    #[tokio::test]
    async fn finds_duplicates_orphans_and_broken_refs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::new(dir.path());
        storage.save("capa.jpg", b"mesmo conteudo").await.expect("save");
        storage.save("copia.jpg", b"mesmo conteudo").await.expect("save");
        storage.save("grande.png", &[7u8; 64]).await.expect("save");
        storage.save("shell.php.jpg", b"<?php").await.expect("save");

        let repo = MemoryAnuncioRepository::new();
        let anuncio = Anuncio::from_patch(
            Uuid::new_v4(),
            None,
            AnuncioPatch {
                nome: Some("Lia".into()),
                foto_capa_url: Some("/api/image/capa.jpg".into()),
                galeria: Some(vec![
                    "/api/image/sumiu.jpg".into(),
                    "https://placehold.co/600x400".into(),
                ]),
                ..AnuncioPatch::default()
            },
            Utc::now(),
        )
        .expect("anúncio");
        repo.insert(&anuncio).await.expect("insert");

        let report = audit_uploads(&storage, &repo, 32).await.expect("auditoria");

        assert_eq!(report.total_arquivos, 4);
        assert_eq!(report.duplicados.len(), 1);
        assert_eq!(report.duplicados[0].arquivos, vec!["capa.jpg".to_string(), "copia.jpg".to_string()]);
        assert_eq!(report.bytes_duplicados(), 14);
        assert_eq!(report.grandes, vec![ArquivoGrande { nome: "grande.png".into(), tamanho: 64 }]);
        assert_eq!(report.suspeitos, vec!["shell.php.jpg".to_string()]);
        assert_eq!(
            report.orfaos,
            vec!["copia.jpg".to_string(), "grande.png".to_string(), "shell.php.jpg".to_string()]
        );
        assert_eq!(report.referencias_quebradas.len(), 1);
        assert_eq!(report.referencias_quebradas[0].url, "/api/image/sumiu.jpg");
        assert!(report.has_findings());
    }

    #[tokio::test]
    async fn empty_directory_is_clean() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::new(dir.path().join("nao-existe"));
        let repo = MemoryAnuncioRepository::new();
        let report = audit_uploads(&storage, &repo, 1024).await.expect("auditoria");
        assert_eq!(report.total_arquivos, 0);
        assert!(!report.has_findings());
    }
}
