// src/models/anuncio.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{error::AppError, text::{clean_optional, fold_text}},
    location::estados::{normalize_state, Estado},
    models::auth::User,
};

// --- 1. Status do anúncio ---
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnuncioStatus {
    #[default]
    #[serde(alias = "pending")]
    Pendente,
    #[serde(alias = "active")]
    Ativo,
    #[serde(alias = "inactive")]
    Inativo,
    #[serde(alias = "rejected")]
    Rejeitado,
}

impl AnuncioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnuncioStatus::Pendente => "pendente",
            AnuncioStatus::Ativo => "ativo",
            AnuncioStatus::Inativo => "inativo",
            AnuncioStatus::Rejeitado => "rejeitado",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pendente" | "pending" => Some(AnuncioStatus::Pendente),
            "ativo" | "active" => Some(AnuncioStatus::Ativo),
            "inativo" | "inactive" => Some(AnuncioStatus::Inativo),
            "rejeitado" | "rejected" => Some(AnuncioStatus::Rejeitado),
            _ => None,
        }
    }
}

// --- 2. Documentos de verificação ---
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Documentos {
    pub frente_url: Option<String>,
    pub verso_url: Option<String>,
    pub selfie_url: Option<String>,
}

impl Documentos {
    pub fn is_empty(&self) -> bool {
        self.frente_url.is_none() && self.verso_url.is_none() && self.selfie_url.is_none()
    }
}

// --- 3. O anúncio canônico ---
// Um único nome por campo. Os apelidos legados (name, category, galeria_N_url...)
// só existem na borda, em `AnuncioPayload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Anuncio {
    pub id: Uuid,
    pub user_id: Option<Uuid>,

    #[schema(example = "Ana Paula")]
    pub nome: String,
    #[schema(example = "Acompanhante")]
    pub categoria: Option<String>,
    pub descricao: Option<String>,
    pub idade: Option<String>,
    pub telefone: Option<String>,
    pub whatsapp: Option<String>,

    #[schema(example = "Campinas")]
    pub cidade: Option<String>,
    // Texto livre como enviado ("SP", "São Paulo", "sp"...)
    #[schema(example = "SP")]
    pub estado: Option<String>,

    // Preços são texto livre ("R$ 150", "a combinar")
    pub preco: Option<String>,
    pub preco_meia_hora: Option<String>,
    pub preco_hora: Option<String>,
    pub preco_pernoite: Option<String>,

    #[serde(default)]
    pub servicos: Vec<String>,
    pub foto_capa_url: Option<String>,
    #[serde(default)]
    pub galeria: Vec<String>,
    // Documentos de identidade: só o dono e admins enxergam
    #[serde(default, skip_serializing_if = "Documentos::is_empty")]
    pub documentos: Documentos,

    #[serde(default)]
    pub verificado: bool,
    #[serde(default)]
    pub status: AnuncioStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Anuncio {
    /// Monta um anúncio novo a partir dos campos enviados. `nome` é obrigatório.
    pub fn from_patch(id: Uuid, user_id: Option<Uuid>, patch: AnuncioPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let nome = clean_optional(patch.nome.clone())
            .ok_or_else(|| AppError::field("nome", "required", "O campo 'nome' é obrigatório."))?;

        let mut anuncio = Anuncio {
            id,
            user_id,
            nome,
            categoria: None,
            descricao: None,
            idade: None,
            telefone: None,
            whatsapp: None,
            cidade: None,
            estado: None,
            preco: None,
            preco_meia_hora: None,
            preco_hora: None,
            preco_pernoite: None,
            servicos: Vec::new(),
            foto_capa_url: None,
            galeria: Vec::new(),
            documentos: Documentos::default(),
            verificado: false,
            status: AnuncioStatus::Pendente,
            created_at: now,
            updated_at: now,
        };
        anuncio.apply_patch(patch, now);
        Ok(anuncio)
    }

    /// Sobrescreve somente os campos presentes no patch e atualiza `updated_at`.
    pub fn apply_patch(&mut self, patch: AnuncioPatch, now: DateTime<Utc>) {
        if let Some(nome) = clean_optional(patch.nome) {
            self.nome = nome;
        }
        set_if_present(&mut self.categoria, patch.categoria);
        set_if_present(&mut self.descricao, patch.descricao);
        set_if_present(&mut self.idade, patch.idade);
        set_if_present(&mut self.telefone, patch.telefone);
        set_if_present(&mut self.whatsapp, patch.whatsapp);
        set_if_present(&mut self.cidade, patch.cidade);
        set_if_present(&mut self.estado, patch.estado);
        set_if_present(&mut self.preco, patch.preco);
        set_if_present(&mut self.preco_meia_hora, patch.preco_meia_hora);
        set_if_present(&mut self.preco_hora, patch.preco_hora);
        set_if_present(&mut self.preco_pernoite, patch.preco_pernoite);
        set_if_present(&mut self.foto_capa_url, patch.foto_capa_url);
        set_if_present(&mut self.documentos.frente_url, patch.documento_frente_url);
        set_if_present(&mut self.documentos.verso_url, patch.documento_verso_url);
        set_if_present(&mut self.documentos.selfie_url, patch.selfie_url);

        if let Some(servicos) = patch.servicos {
            self.servicos = clean_list(servicos);
        }
        if let Some(galeria) = patch.galeria {
            self.galeria = clean_list(galeria);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(verificado) = patch.verificado {
            self.verificado = verificado;
        }

        self.updated_at = now;
    }

    /// Dono do anúncio ou admin.
    pub fn is_managed_by(&self, user: &User) -> bool {
        user.is_admin() || self.user_id == Some(user.id)
    }

    /// Versão para quem não é dono nem admin: sem os documentos de verificação.
    pub fn without_documents(mut self) -> Self {
        self.documentos = Documentos::default();
        self
    }

    pub fn for_viewer(self, viewer: Option<&User>) -> Self {
        if viewer.is_some_and(|user| self.is_managed_by(user)) {
            self
        } else {
            self.without_documents()
        }
    }

    /// UF do anúncio, se o texto do campo `estado` for reconhecido.
    pub fn estado_uf(&self) -> Option<&'static Estado> {
        self.estado.as_deref().and_then(normalize_state)
    }

    pub fn cidade_normalizada(&self) -> Option<String> {
        self.cidade.as_deref().map(fold_text).filter(|c| !c.is_empty())
    }

    /// Todas as URLs de arquivo referenciadas pelo anúncio.
    pub fn file_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = Vec::new();
        urls.extend(self.foto_capa_url.as_deref());
        urls.extend(self.galeria.iter().map(String::as_str));
        urls.extend(self.documentos.frente_url.as_deref());
        urls.extend(self.documentos.verso_url.as_deref());
        urls.extend(self.documentos.selfie_url.as_deref());
        urls
    }
}

fn set_if_present(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        // String vazia apaga o campo
        *target = clean_optional(Some(value));
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| clean_optional(Some(v)))
        .collect()
}

// --- 4. Patch interno (campos opcionais) ---
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnuncioPatch {
    pub nome: Option<String>,
    pub categoria: Option<String>,
    pub descricao: Option<String>,
    pub idade: Option<String>,
    pub telefone: Option<String>,
    pub whatsapp: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub preco: Option<String>,
    pub preco_meia_hora: Option<String>,
    pub preco_hora: Option<String>,
    pub preco_pernoite: Option<String>,
    pub servicos: Option<Vec<String>>,
    pub foto_capa_url: Option<String>,
    pub galeria: Option<Vec<String>>,
    pub documento_frente_url: Option<String>,
    pub documento_verso_url: Option<String>,
    pub selfie_url: Option<String>,
    pub status: Option<AnuncioStatus>,
    pub verificado: Option<bool>,
}

impl AnuncioPatch {
    /// Limites de texto de `nome`, `categoria` e `descricao`, para qualquer origem.
    pub fn validate_limits(&self) -> Result<(), AppError> {
        let campos = [("nome", &self.nome), ("categoria", &self.categoria), ("descricao", &self.descricao)];
        for (campo, valor) in campos {
            if let Some(message) = valor.as_deref().and_then(|v| text_limit_violation(campo, v)) {
                return Err(AppError::field(campo, "length", message));
            }
        }
        Ok(())
    }
}

pub const NOME_MIN_CHARS: usize = 2;
pub const NOME_MAX_CHARS: usize = 120;
pub const CATEGORIA_MAX_CHARS: usize = 80;
pub const DESCRICAO_MAX_CHARS: usize = 5000;

/// Mensagem de erro se o texto do campo estourar o limite.
pub fn text_limit_violation(campo: &str, valor: &str) -> Option<&'static str> {
    let len = valor.trim().chars().count();
    match campo {
        "nome" if !(NOME_MIN_CHARS..=NOME_MAX_CHARS).contains(&len) => {
            Some("O nome deve ter entre 2 e 120 caracteres.")
        }
        "categoria" if len > CATEGORIA_MAX_CHARS => Some("A categoria deve ter no máximo 80 caracteres."),
        "descricao" if len > DESCRICAO_MAX_CHARS => Some("A descrição deve ter no máximo 5000 caracteres."),
        _ => None,
    }
}

// ---
// Validação Customizada
// ---
fn validate_estado(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || normalize_state(value).is_some() {
        return Ok(());
    }
    let mut err = ValidationError::new("estado");
    err.message = Some("Estado não reconhecido. Use a sigla (ex: SP) ou o nome.".into());
    Err(err)
}

// --- 5. Payload da API (POST/PUT) ---
// Aceita os nomes canônicos e os apelidos legados dos documentos antigos.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnuncioPayload {
    #[serde(alias = "name")]
    #[validate(length(min = 2, max = 120, message = "O nome deve ter entre 2 e 120 caracteres."))]
    pub nome: Option<String>,

    #[serde(alias = "category")]
    #[validate(length(max = 80, message = "A categoria deve ter no máximo 80 caracteres."))]
    pub categoria: Option<String>,

    #[serde(alias = "description")]
    #[validate(length(max = 5000, message = "A descrição deve ter no máximo 5000 caracteres."))]
    pub descricao: Option<String>,

    #[serde(alias = "age")]
    pub idade: Option<String>,

    #[serde(alias = "phone")]
    pub telefone: Option<String>,
    pub whatsapp: Option<String>,

    #[serde(alias = "city")]
    pub cidade: Option<String>,

    #[serde(alias = "state")]
    #[validate(custom(function = "validate_estado"))]
    pub estado: Option<String>,

    #[serde(alias = "price")]
    pub preco: Option<String>,
    #[serde(alias = "preco_meia_hora")]
    pub preco_meia_hora: Option<String>,
    #[serde(alias = "preco_hora")]
    pub preco_hora: Option<String>,
    #[serde(alias = "preco_pernoite")]
    pub preco_pernoite: Option<String>,

    #[serde(alias = "services")]
    pub servicos: Option<Vec<String>>,

    #[serde(alias = "foto_capa_url")]
    pub foto_capa_url: Option<String>,

    pub galeria: Option<Vec<String>>,

    #[serde(alias = "documento_frente_url")]
    pub documento_frente_url: Option<String>,
    #[serde(alias = "documento_verso_url")]
    pub documento_verso_url: Option<String>,
    #[serde(alias = "selfie_url")]
    pub selfie_url: Option<String>,

    // Campos desconhecidos; daqui saem os `galeria_N_url` legados.
    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AnuncioPayload {
    /// Converte o payload da borda para o patch canônico.
    pub fn into_patch(self) -> AnuncioPatch {
        let galeria = self.galeria.or_else(|| legacy_gallery(&self.extra));

        AnuncioPatch {
            nome: self.nome,
            categoria: self.categoria,
            descricao: self.descricao,
            idade: self.idade,
            telefone: self.telefone,
            whatsapp: self.whatsapp,
            cidade: self.cidade,
            estado: self.estado,
            preco: self.preco,
            preco_meia_hora: self.preco_meia_hora,
            preco_hora: self.preco_hora,
            preco_pernoite: self.preco_pernoite,
            servicos: self.servicos,
            foto_capa_url: self.foto_capa_url,
            galeria,
            documento_frente_url: self.documento_frente_url,
            documento_verso_url: self.documento_verso_url,
            selfie_url: self.selfie_url,
            status: None,
            verificado: None,
        }
    }
}

/// Junta `galeria_1_url`, `galeria_2_url`, ... na ordem do índice.
fn legacy_gallery(extra: &BTreeMap<String, serde_json::Value>) -> Option<Vec<String>> {
    let mut indexed: Vec<(u32, String)> = extra
        .iter()
        .filter_map(|(key, value)| {
            let index = key
                .strip_prefix("galeria_")?
                .strip_suffix("_url")?
                .parse::<u32>()
                .ok()?;
            let url = value.as_str()?.trim();
            (!url.is_empty()).then(|| (index, url.to_string()))
        })
        .collect();

    if indexed.is_empty() {
        return None;
    }
    indexed.sort_by_key(|(index, _)| *index);
    Some(indexed.into_iter().map(|(_, url)| url).collect())
}

// --- 6. Filtros de listagem ---
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListAnunciosQuery {
    /// Categoria (case-insensitive)
    pub categoria: Option<String>,
    /// pendente | ativo | inativo | rejeitado
    pub status: Option<String>,
    /// Sigla ou nome do estado
    pub estado: Option<String>,
    pub cidade: Option<String>,
    pub limit: Option<usize>,
}

pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 500;

impl ListAnunciosQuery {
    pub fn into_filter(self) -> Result<AnuncioFilter, AppError> {
        let status = match clean_optional(self.status) {
            Some(raw) => Some(AnuncioStatus::parse(&raw).ok_or_else(|| {
                AppError::BadRequest(format!("Status '{}' inválido.", raw))
            })?),
            None => None,
        };
        let estado = match clean_optional(self.estado) {
            Some(raw) => Some(normalize_state(&raw).ok_or(AppError::UnknownState(raw))?),
            None => None,
        };

        Ok(AnuncioFilter {
            categoria: clean_optional(self.categoria),
            status,
            estado,
            cidade: clean_optional(self.cidade),
            limit: Some(self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnuncioFilter {
    pub categoria: Option<String>,
    pub status: Option<AnuncioStatus>,
    pub estado: Option<&'static Estado>,
    pub cidade: Option<String>,
    // None = sem limite (uso interno: vitrine, auditoria)
    pub limit: Option<usize>,
}

impl AnuncioFilter {
    pub fn only_status(status: AnuncioStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub fn matches(&self, anuncio: &Anuncio) -> bool {
        if let Some(categoria) = &self.categoria {
            let same = anuncio
                .categoria
                .as_deref()
                .is_some_and(|c| fold_text(c) == fold_text(categoria));
            if !same {
                return false;
            }
        }
        if let Some(status) = self.status {
            if anuncio.status != status {
                return false;
            }
        }
        if let Some(estado) = self.estado {
            if anuncio.estado_uf() != Some(estado) {
                return false;
            }
        }
        if let Some(cidade) = &self.cidade {
            if anuncio.cidade_normalizada().as_deref() != Some(fold_text(cidade).as_str()) {
                return false;
            }
        }
        true
    }
}

// --- 7. Moderação (admin) ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModeracaoPayload {
    pub status: Option<AnuncioStatus>,
    pub verificado: Option<bool>,
}
