// src/services/wizard_service.rs

// Assistente de cadastro em telas (tela0..tela14). O estado de cada sessão é um
// mapa plano campo -> valor + a tela atual, guardado no servidor com TTL.

use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::{
    common::error::AppError,
    location::estados::normalize_state,
    models::{
        anuncio::{text_limit_violation, Anuncio, AnuncioPatch},
        auth::{User, UserRole},
    },
    services::{anuncio_service::AnuncioService, auth::AuthService},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tela {
    pub numero: u8,
    pub nome: &'static str,
    pub obrigatorios: &'static [&'static str],
    pub opcionais: &'static [&'static str],
}

impl Tela {
    fn aceita(&self, campo: &str) -> bool {
        self.obrigatorios.contains(&campo) || self.opcionais.contains(&campo)
    }
}

pub const ULTIMA_TELA: u8 = 14;

pub static TELAS: [Tela; 15] = [
    Tela { numero: 0, nome: "termos", obrigatorios: &["aceite_termos"], opcionais: &[] },
    Tela { numero: 1, nome: "conta", obrigatorios: &["email", "senha"], opcionais: &["confirmacao_senha"] },
    Tela { numero: 2, nome: "identificacao", obrigatorios: &["nome", "idade"], opcionais: &[] },
    Tela { numero: 3, nome: "contato", obrigatorios: &["telefone"], opcionais: &["whatsapp"] },
    Tela { numero: 4, nome: "localizacao", obrigatorios: &["estado", "cidade"], opcionais: &[] },
    Tela { numero: 5, nome: "categoria", obrigatorios: &["categoria"], opcionais: &[] },
    Tela { numero: 6, nome: "descricao", obrigatorios: &["descricao"], opcionais: &[] },
    Tela { numero: 7, nome: "servicos", obrigatorios: &["servicos"], opcionais: &[] },
    Tela {
        numero: 8,
        nome: "precos",
        obrigatorios: &["preco"],
        opcionais: &["preco_meia_hora", "preco_hora", "preco_pernoite"],
    },
    Tela { numero: 9, nome: "foto_capa", obrigatorios: &["foto_capa_url"], opcionais: &[] },
    Tela {
        numero: 10,
        nome: "galeria",
        obrigatorios: &[],
        opcionais: &[
            "galeria_1_url", "galeria_2_url", "galeria_3_url", "galeria_4_url",
            "galeria_5_url", "galeria_6_url", "galeria_7_url", "galeria_8_url",
        ],
    },
    Tela { numero: 11, nome: "documento_frente", obrigatorios: &["documento_frente_url"], opcionais: &[] },
    Tela { numero: 12, nome: "documento_verso", obrigatorios: &["documento_verso_url"], opcionais: &[] },
    Tela { numero: 13, nome: "selfie", obrigatorios: &["selfie_url"], opcionais: &[] },
    Tela { numero: 14, nome: "revisao", obrigatorios: &[], opcionais: &[] },
];

pub fn tela(numero: u8) -> Option<&'static Tela> {
    TELAS.get(usize::from(numero))
}

#[derive(Debug, Clone)]
pub struct WizardState {
    pub id: Uuid,
    pub tela_atual: u8,
    pub campos: BTreeMap<String, String>,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: DateTime<Utc>,
}

// Dados enviados ao concluir o cadastro
#[derive(Debug)]
pub struct WizardSubmission {
    pub email: String,
    pub senha: String,
    pub nome: String,
    pub patch: AnuncioPatch,
}

impl WizardState {
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self { id, tela_atual: 0, campos: BTreeMap::new(), criado_em: now, atualizado_em: now }
    }

    /// Grava os campos de uma tela e avança se ela for a tela atual.
    /// Não é possível pular telas.
    pub fn submit(&mut self, numero: u8, campos: BTreeMap<String, String>) -> Result<(), AppError> {
        let tela = tela(numero).ok_or_else(|| AppError::WizardError(format!("Tela {} não existe.", numero)))?;
        if numero > self.tela_atual {
            return Err(AppError::WizardError(format!(
                "Conclua a tela {} antes de avançar para a tela {}.",
                self.tela_atual, numero
            )));
        }

        if let Some(desconhecido) = campos.keys().find(|campo| !tela.aceita(campo)) {
            return Err(AppError::WizardError(format!(
                "Campo '{}' não pertence à tela '{}'.",
                desconhecido, tela.nome
            )));
        }

        // Mescla numa cópia: se a validação falhar, a sessão fica como estava
        let mut merged = self.campos.clone();
        for (campo, valor) in campos {
            let valor = valor.trim().to_string();
            if valor.is_empty() {
                merged.remove(&campo);
            } else {
                merged.insert(campo, valor);
            }
        }

        validate_tela(tela, &merged)?;

        self.campos = merged;
        if numero == self.tela_atual && numero < ULTIMA_TELA {
            self.tela_atual += 1;
        }
        self.atualizado_em = Utc::now();
        Ok(())
    }

    pub fn back(&mut self) {
        self.tela_atual = self.tela_atual.saturating_sub(1);
        self.atualizado_em = Utc::now();
    }

    /// Revalida todas as telas e monta o cadastro final.
    pub fn submission(&self) -> Result<WizardSubmission, AppError> {
        if self.tela_atual < ULTIMA_TELA {
            return Err(AppError::WizardError(format!(
                "Cadastro incompleto: tela atual {} de {}.",
                self.tela_atual, ULTIMA_TELA
            )));
        }
        for tela in TELAS.iter() {
            validate_tela(tela, &self.campos)?;
        }

        let campo = |nome: &str| self.campos.get(nome).cloned();
        let galeria: Vec<String> = (1..=8)
            .filter_map(|i| self.campos.get(&format!("galeria_{}_url", i)).cloned())
            .collect();
        let servicos = campo("servicos")
            .map(|s| s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect());

        Ok(WizardSubmission {
            email: campo("email").unwrap_or_default(),
            senha: campo("senha").unwrap_or_default(),
            nome: campo("nome").unwrap_or_default(),
            patch: AnuncioPatch {
                nome: campo("nome"),
                idade: campo("idade"),
                telefone: campo("telefone"),
                whatsapp: campo("whatsapp"),
                estado: campo("estado"),
                cidade: campo("cidade"),
                categoria: campo("categoria"),
                descricao: campo("descricao"),
                servicos,
                preco: campo("preco"),
                preco_meia_hora: campo("preco_meia_hora"),
                preco_hora: campo("preco_hora"),
                preco_pernoite: campo("preco_pernoite"),
                foto_capa_url: campo("foto_capa_url"),
                galeria: (!galeria.is_empty()).then_some(galeria),
                documento_frente_url: campo("documento_frente_url"),
                documento_verso_url: campo("documento_verso_url"),
                selfie_url: campo("selfie_url"),
                ..AnuncioPatch::default()
            },
        })
    }

    pub fn view(&self) -> WizardView {
        let atual = tela(self.tela_atual).unwrap_or(&TELAS[0]);
        // A senha nunca volta para o cliente
        let campos = self
            .campos
            .iter()
            .filter(|(k, _)| k.as_str() != "senha" && k.as_str() != "confirmacao_senha")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        WizardView {
            id: self.id,
            tela_atual: self.tela_atual,
            nome_tela: atual.nome.to_string(),
            obrigatorios: atual.obrigatorios.iter().map(|c| c.to_string()).collect(),
            total_telas: TELAS.len() as u8,
            campos,
            atualizado_em: self.atualizado_em,
        }
    }
}

fn validate_tela(tela: &Tela, campos: &BTreeMap<String, String>) -> Result<(), AppError> {
    for obrigatorio in tela.obrigatorios {
        if !campos.contains_key(*obrigatorio) {
            return Err(AppError::WizardError(format!(
                "O campo '{}' é obrigatório na tela '{}'.",
                obrigatorio, tela.nome
            )));
        }
    }

    let get = |campo: &str| campos.get(campo).map(String::as_str);

    match tela.numero {
        0 => {
            let aceite = get("aceite_termos").unwrap_or_default().to_lowercase();
            if !matches!(aceite.as_str(), "true" | "sim" | "1" | "on") {
                return Err(AppError::WizardError("É preciso aceitar os termos de uso.".to_string()));
            }
        }
        1 => {
            if !get("email").unwrap_or_default().validate_email() {
                return Err(AppError::WizardError("O e-mail fornecido é inválido.".to_string()));
            }
            let senha = get("senha").unwrap_or_default();
            if senha.chars().count() < 6 {
                return Err(AppError::WizardError("A senha deve ter no mínimo 6 caracteres.".to_string()));
            }
            if let Some(confirmacao) = get("confirmacao_senha") {
                if confirmacao != senha {
                    return Err(AppError::WizardError("As senhas não conferem.".to_string()));
                }
            }
        }
        2 => {
            let idade: u8 = get("idade")
                .and_then(|i| i.parse().ok())
                .ok_or_else(|| AppError::WizardError("Idade inválida.".to_string()))?;
            if !(18..=99).contains(&idade) {
                return Err(AppError::WizardError("É preciso ter 18 anos ou mais.".to_string()));
            }
        }
        3 => {
            let digitos = get("telefone").unwrap_or_default().chars().filter(char::is_ascii_digit).count();
            if !(10..=13).contains(&digitos) {
                return Err(AppError::WizardError("Telefone inválido (use DDD + número).".to_string()));
            }
        }
        4 => {
            let estado = get("estado").unwrap_or_default();
            if normalize_state(estado).is_none() {
                return Err(AppError::UnknownState(estado.to_string()));
            }
        }
        _ => {}
    }

    // Mesmos limites de texto do POST /api/anuncios
    for &campo in tela.obrigatorios.iter().chain(tela.opcionais) {
        if let Some(message) = get(campo).and_then(|valor| text_limit_violation(campo, valor)) {
            return Err(AppError::WizardError(message.to_string()));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub id: Uuid,
    pub tela_atual: u8,
    pub nome_tela: String,
    pub obrigatorios: Vec<String>,
    pub total_telas: u8,
    pub campos: BTreeMap<String, String>,
    pub atualizado_em: DateTime<Utc>,
}

#[derive(Clone)]
pub struct WizardService {
    sessions: Cache<Uuid, WizardState>,
    auth: AuthService,
    anuncios: AnuncioService,
}

impl WizardService {
    pub fn new(auth: AuthService, anuncios: AnuncioService, session_ttl: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(session_ttl)
            .build();
        Self { sessions, auth, anuncios }
    }

    pub async fn start(&self) -> WizardState {
        let state = WizardState::new(Uuid::new_v4());
        self.sessions.insert(state.id, state.clone()).await;
        tracing::debug!("🧭 Sessão de cadastro iniciada: {}", state.id);
        state
    }

    pub async fn get(&self, id: Uuid) -> Result<WizardState, AppError> {
        self.sessions.get(&id).await.ok_or(AppError::WizardSessionNotFound)
    }

    pub async fn submit(&self, id: Uuid, numero: u8, campos: BTreeMap<String, String>) -> Result<WizardState, AppError> {
        let mut state = self.get(id).await?;
        state.submit(numero, campos)?;
        self.sessions.insert(id, state.clone()).await;
        Ok(state)
    }

    pub async fn back(&self, id: Uuid) -> Result<WizardState, AppError> {
        let mut state = self.get(id).await?;
        state.back();
        self.sessions.insert(id, state.clone()).await;
        Ok(state)
    }

    /// Cria a conta de anunciante + o anúncio pendente e encerra a sessão.
    pub async fn finish(&self, id: Uuid) -> Result<(String, User, Anuncio), AppError> {
        let state = self.get(id).await?;
        let submission = state.submission()?;
        submission.patch.validate_limits()?;

        let user = self
            .auth
            .create_user_with_role(&submission.email, &submission.senha, Some(submission.nome), UserRole::Advertiser)
            .await?;

        // Sem anúncio, a conta é desfeita: a sessão continua e o "concluir" pode ser repetido
        let anuncio = match self.anuncios.create(Some(&user), submission.patch).await {
            Ok(anuncio) => anuncio,
            Err(err) => {
                tracing::warn!("⚠️ Falha ao criar o anúncio do cadastro {}: {}", id, err);
                match self.auth.user_repo().delete(user.id).await {
                    Ok(_) => tracing::info!("↩️ Conta {} desfeita", user.email),
                    Err(undo) => tracing::error!("🔥 Conta órfã {} ({}): {}", user.email, user.id, undo),
                }
                return Err(err);
            }
        };
        let token = self.auth.create_token(&user)?;

        self.sessions.invalidate(&id).await;
        tracing::info!("🎉 Cadastro concluído: {} -> anúncio {}", user.email, anuncio.id);
        Ok((token, user, anuncio))
    }
}
