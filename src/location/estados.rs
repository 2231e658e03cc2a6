// src/location/estados.rs

use serde::Serialize;

use crate::common::text::fold_text;

// Uma unidade federativa: sigla (UF) + nome por extenso.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Estado {
    pub sigla: &'static str,
    pub nome: &'static str,
}

pub const DISTRITO_FEDERAL: &str = "DF";

pub static ESTADOS: [Estado; 27] = [
    Estado { sigla: "AC", nome: "Acre" },
    Estado { sigla: "AL", nome: "Alagoas" },
    Estado { sigla: "AP", nome: "Amapá" },
    Estado { sigla: "AM", nome: "Amazonas" },
    Estado { sigla: "BA", nome: "Bahia" },
    Estado { sigla: "CE", nome: "Ceará" },
    Estado { sigla: "DF", nome: "Distrito Federal" },
    Estado { sigla: "ES", nome: "Espírito Santo" },
    Estado { sigla: "GO", nome: "Goiás" },
    Estado { sigla: "MA", nome: "Maranhão" },
    Estado { sigla: "MT", nome: "Mato Grosso" },
    Estado { sigla: "MS", nome: "Mato Grosso do Sul" },
    Estado { sigla: "MG", nome: "Minas Gerais" },
    Estado { sigla: "PA", nome: "Pará" },
    Estado { sigla: "PB", nome: "Paraíba" },
    Estado { sigla: "PR", nome: "Paraná" },
    Estado { sigla: "PE", nome: "Pernambuco" },
    Estado { sigla: "PI", nome: "Piauí" },
    Estado { sigla: "RJ", nome: "Rio de Janeiro" },
    Estado { sigla: "RN", nome: "Rio Grande do Norte" },
    Estado { sigla: "RS", nome: "Rio Grande do Sul" },
    Estado { sigla: "RO", nome: "Rondônia" },
    Estado { sigla: "RR", nome: "Roraima" },
    Estado { sigla: "SC", nome: "Santa Catarina" },
    Estado { sigla: "SP", nome: "São Paulo" },
    Estado { sigla: "SE", nome: "Sergipe" },
    Estado { sigla: "TO", nome: "Tocantins" },
];

impl Estado {
    pub fn is_distrito_federal(&self) -> bool {
        self.sigla == DISTRITO_FEDERAL
    }
}

/// Converte o texto livre do campo "estado" (sigla ou nome, com ou sem
/// acento, qualquer caixa) para a UF correspondente.
pub fn normalize_state(input: &str) -> Option<&'static Estado> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.len() == 2 {
        if let Some(estado) = ESTADOS
            .iter()
            .find(|e| e.sigla.eq_ignore_ascii_case(trimmed))
        {
            return Some(estado);
        }
    }

    let folded = fold_text(trimmed);
    // Alguns provedores de geo-IP devolvem "State of São Paulo" ou "Federal District".
    let folded = folded
        .strip_prefix("state of ")
        .or_else(|| folded.strip_prefix("estado de "))
        .or_else(|| folded.strip_prefix("estado do "))
        .unwrap_or(&folded);

    if folded == "federal district" || folded == "brasilia" {
        return by_sigla(DISTRITO_FEDERAL);
    }

    ESTADOS.iter().find(|e| fold_text(e.nome) == folded)
}

/// Busca exata pela sigla (case-insensitive).
pub fn by_sigla(sigla: &str) -> Option<&'static Estado> {
    ESTADOS.iter().find(|e| e.sigla.eq_ignore_ascii_case(sigla.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_codes_in_any_case() {
        assert_eq!(normalize_state("df").map(|e| e.sigla), Some("DF"));
        assert_eq!(normalize_state(" SP ").map(|e| e.sigla), Some("SP"));
        assert_eq!(normalize_state("Rj").map(|e| e.sigla), Some("RJ"));
    }

    #[test]
    fn normalizes_names_with_or_without_accents() {
        assert_eq!(normalize_state("São Paulo").map(|e| e.sigla), Some("SP"));
        assert_eq!(normalize_state("sao paulo").map(|e| e.sigla), Some("SP"));
        assert_eq!(normalize_state("Distrito Federal").map(|e| e.sigla), Some("DF"));
        assert_eq!(normalize_state("ESPIRITO SANTO").map(|e| e.sigla), Some("ES"));
        assert_eq!(normalize_state("Mato Grosso do Sul").map(|e| e.sigla), Some("MS"));
        assert_eq!(normalize_state("Mato Grosso").map(|e| e.sigla), Some("MT"));
    }

    #[test]
    fn normalizes_provider_variants() {
        assert_eq!(normalize_state("State of São Paulo").map(|e| e.sigla), Some("SP"));
        assert_eq!(normalize_state("Federal District").map(|e| e.sigla), Some("DF"));
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(normalize_state("").is_none());
        assert!(normalize_state("XX").is_none());
        assert!(normalize_state("Atlantida").is_none());
    }

    #[test]
    fn table_has_every_federative_unit_once() {
        let mut siglas: Vec<_> = ESTADOS.iter().map(|e| e.sigla).collect();
        siglas.sort_unstable();
        siglas.dedup();
        assert_eq!(siglas.len(), 27);
    }
}
