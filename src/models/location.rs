// src/models/location.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    common::{error::AppError, text::clean_optional},
    location::estados::normalize_state,
};

// Resposta de GET /api/location. Mantém o formato { sucesso: bool, ... }
// que as páginas já consomem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationResponse {
    pub sucesso: bool,
    pub ip: Option<String>,
    #[schema(example = "SP")]
    pub estado: Option<String>,
    #[schema(example = "São Paulo")]
    pub estado_nome: Option<String>,
    pub cidade: Option<String>,
    // Provedor que respondeu (ipapi.co / ip-api.com)
    pub fonte: Option<String>,
}

impl LocationResponse {
    pub fn falha(ip: Option<String>) -> Self {
        Self { sucesso: false, ip, ..Self::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocalizacaoEscolhida {
    pub estado: Option<String>,
    pub cidade: Option<String>,
}

// Preferências de localização do usuário (antes: chaves soltas no localStorage).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationPreferences {
    pub filtro_estado: Option<String>,
    pub localizacao_escolhida: Option<LocalizacaoEscolhida>,
    pub estado_selecionado: Option<String>,
    pub cidade_selecionada: Option<String>,
}

impl LocationPreferences {
    /// Normaliza os estados para a sigla da UF e descarta strings vazias.
    /// Estados desconhecidos são rejeitados.
    pub fn normalized(self) -> Result<Self, AppError> {
        let uf = |value: Option<String>| -> Result<Option<String>, AppError> {
            match clean_optional(value) {
                Some(raw) => normalize_state(&raw)
                    .map(|e| Some(e.sigla.to_string()))
                    .ok_or(AppError::UnknownState(raw)),
                None => Ok(None),
            }
        };

        let localizacao_escolhida = match self.localizacao_escolhida {
            Some(loc) => {
                let estado = uf(loc.estado)?;
                let cidade = clean_optional(loc.cidade);
                (estado.is_some() || cidade.is_some())
                    .then_some(LocalizacaoEscolhida { estado, cidade })
            }
            None => None,
        };

        Ok(Self {
            filtro_estado: uf(self.filtro_estado)?,
            localizacao_escolhida,
            estado_selecionado: uf(self.estado_selecionado)?,
            cidade_selecionada: clean_optional(self.cidade_selecionada),
        })
    }
}

// Query de GET /api/vitrine
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VitrineQuery {
    /// Sigla ou nome do estado; ausente = todos
    pub estado: Option<String>,
    pub cidade: Option<String>,
    /// "home" ignora o filtro de estado
    pub pagina: Option<String>,
    /// cards | compact | count
    pub view: Option<String>,
    /// "proximidade" ordena por cidade > estado > resto
    pub ordem: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_normalize_states_to_uf() {
        let prefs = LocationPreferences {
            filtro_estado: Some("São Paulo".into()),
            localizacao_escolhida: Some(LocalizacaoEscolhida {
                estado: Some("rj".into()),
                cidade: Some(" Niterói ".into()),
            }),
            estado_selecionado: Some("".into()),
            cidade_selecionada: None,
        }
        .normalized()
        .expect("preferências válidas");

        assert_eq!(prefs.filtro_estado.as_deref(), Some("SP"));
        assert_eq!(
            prefs.localizacao_escolhida,
            Some(LocalizacaoEscolhida { estado: Some("RJ".into()), cidade: Some("Niterói".into()) })
        );
        assert_eq!(prefs.estado_selecionado, None);
    }

    #[test]
    fn preferences_reject_unknown_state() {
        let prefs = LocationPreferences { filtro_estado: Some("Narnia".into()), ..Default::default() };
        assert!(matches!(prefs.normalized(), Err(AppError::UnknownState(_))));
    }
}
