// src/location/filtro.rs

use rand::{seq::SliceRandom, Rng};

use crate::{
    common::{error::AppError, text::fold_text},
    location::estados::{normalize_state, Estado},
    models::anuncio::Anuncio,
};

/// Estado explícito da listagem filtrável: a cópia original (capturada na
/// primeira aplicação de filtro) e a cópia de trabalho exibida.
#[derive(Debug, Default)]
pub struct ProfilesState {
    original: Option<Vec<Anuncio>>,
    current: Vec<Anuncio>,
    selection: Option<&'static Estado>,
}

impl ProfilesState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Troca os dados da página. Descarta a cópia original anterior.
    pub fn load(&mut self, profiles: Vec<Anuncio>) {
        self.original = None;
        self.current = profiles;
        self.selection = None;
    }

    pub fn current(&self) -> &[Anuncio] {
        &self.current
    }

    pub fn selection(&self) -> Option<&'static Estado> {
        self.selection
    }

    /// Tamanho da listagem completa, antes de qualquer filtro.
    pub fn total(&self) -> usize {
        self.original.as_ref().map_or(self.current.len(), Vec::len)
    }

    /// `None` restaura a listagem completa (embaralhada); `Some(uf)` mantém só os
    /// anúncios daquele estado, comparando após normalizar o texto livre.
    pub fn apply_state_filter<R: Rng + ?Sized>(
        &mut self,
        state: Option<&str>,
        rng: &mut R,
    ) -> Result<&[Anuncio], AppError> {
        self.apply_location_filter(state, None, rng)
    }

    /// Filtro por estado e, opcionalmente, cidade (sem acento/caixa).
    pub fn apply_location_filter<R: Rng + ?Sized>(
        &mut self,
        state: Option<&str>,
        city: Option<&str>,
        rng: &mut R,
    ) -> Result<&[Anuncio], AppError> {
        let estado = match state {
            Some(raw) => Some(normalize_state(raw).ok_or_else(|| AppError::UnknownState(raw.to_string()))?),
            None => None,
        };

        let original = self.original.get_or_insert_with(|| self.current.clone());
        let mut filtered = filter_by_location(original, estado, city);
        filtered.shuffle(rng);

        tracing::debug!(
            "🔎 Filtro de localização {:?}/{:?}: {} de {} anúncios",
            estado.map(|e| e.sigla),
            city,
            filtered.len(),
            original.len()
        );

        self.current = filtered;
        self.selection = estado;
        Ok(&self.current)
    }
}

pub fn filter_by_location(
    profiles: &[Anuncio],
    estado: Option<&'static Estado>,
    city: Option<&str>,
) -> Vec<Anuncio> {
    let city = city.map(fold_text).filter(|c| !c.is_empty());
    profiles
        .iter()
        .filter(|p| estado.is_none_or(|e| p.estado_uf() == Some(e)))
        .filter(|p| match &city {
            Some(c) => p.cidade_normalizada().as_deref() == Some(c.as_str()),
            None => true,
        })
        .cloned()
        .collect()
}

/// Reordena por proximidade: mesma cidade, depois mesmo estado, depois o resto.
/// Cada faixa é embaralhada separadamente.
pub fn order_by_proximity<R: Rng + ?Sized>(
    profiles: Vec<Anuncio>,
    estado: Option<&'static Estado>,
    city: Option<&str>,
    rng: &mut R,
) -> Vec<Anuncio> {
    let city = city.map(fold_text).filter(|c| !c.is_empty());
    let mut same_city = Vec::new();
    let mut same_state = Vec::new();
    let mut rest = Vec::new();

    for profile in profiles {
        let state_match = estado.is_some() && profile.estado_uf() == estado;
        let city_match = city.is_some() && profile.cidade_normalizada() == city;
        if state_match && city_match {
            same_city.push(profile);
        } else if state_match {
            same_state.push(profile);
        } else {
            rest.push(profile);
        }
    }

    same_city.shuffle(rng);
    same_state.shuffle(rng);
    rest.shuffle(rng);

    same_city.extend(same_state);
    same_city.extend(rest);
    same_city
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;
    use rand::{rngs::StdRng, SeedableRng};
    use uuid::Uuid;

    use super::*;
    use crate::models::anuncio::AnuncioPatch;

    fn perfil(nome: &str, estado: &str, cidade: &str) -> Anuncio {
        Anuncio::from_patch(
            Uuid::new_v4(),
            None,
            AnuncioPatch {
                nome: Some(nome.into()),
                estado: Some(estado.into()),
                cidade: Some(cidade.into()),
                ..AnuncioPatch::default()
            },
            Utc::now(),
        )
        .expect("perfil válido")
    }

    fn ids(profiles: &[Anuncio]) -> HashSet<Uuid> {
        profiles.iter().map(|p| p.id).collect()
    }

    #[test]
    fn df_filter_matches_every_textual_form() {
        let fixture = vec![
            perfil("a", "Distrito Federal", "Brasília"),
            perfil("b", "DF", "Taguatinga"),
            perfil("c", "df", "Gama"),
            perfil("d", "GO", "Goiânia"),
            perfil("e", "São Paulo", "Santos"),
        ];
        let expected: HashSet<Uuid> = fixture[..3].iter().map(|p| p.id).collect();

        let mut state = ProfilesState::new();
        state.load(fixture);
        let mut rng = StdRng::seed_from_u64(7);
        let filtered = state.apply_state_filter(Some("DF"), &mut rng).expect("filtro aplicado");

        assert_eq!(ids(filtered), expected);
        assert_eq!(state.selection().map(|e| e.sigla), Some("DF"));
    }

    #[test]
    fn sp_filter_accepts_code_and_name() {
        let fixture = vec![
            perfil("1", "SP", "Campinas"),
            perfil("2", "São Paulo", "São Paulo"),
            perfil("3", "RJ", "Rio de Janeiro"),
        ];
        let expected: HashSet<Uuid> = fixture[..2].iter().map(|p| p.id).collect();

        let mut state = ProfilesState::new();
        state.load(fixture);
        let filtered = state
            .apply_state_filter(Some("SP"), &mut StdRng::seed_from_u64(1))
            .expect("filtro aplicado");
        assert_eq!(ids(filtered), expected);
    }

    #[test]
    fn clearing_filter_restores_full_snapshot() {
        let fixture = vec![
            perfil("1", "SP", "Campinas"),
            perfil("2", "RJ", "Niterói"),
            perfil("3", "MG", "Belo Horizonte"),
            perfil("4", "sp", "Santos"),
        ];
        let all = ids(&fixture);

        let mut state = ProfilesState::new();
        state.load(fixture);
        let mut rng = StdRng::seed_from_u64(42);

        assert_eq!(state.apply_state_filter(Some("RJ"), &mut rng).expect("rj").len(), 1);
        let restored = state.apply_state_filter(None, &mut rng).expect("restaurado");
        assert_eq!(restored.len(), 4);
        assert_eq!(ids(restored), all);
        assert_eq!(state.selection(), None);
        assert_eq!(state.total(), 4);
    }

    #[test]
    fn consecutive_filters_start_from_the_original() {
        let mut state = ProfilesState::new();
        state.load(vec![perfil("1", "SP", "Campinas"), perfil("2", "RJ", "Niterói")]);
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(state.apply_state_filter(Some("SP"), &mut rng).expect("sp").len(), 1);
        // RJ não pode sumir só porque o filtro anterior era SP
        assert_eq!(state.apply_state_filter(Some("RJ"), &mut rng).expect("rj").len(), 1);
    }

    #[test]
    fn unknown_state_is_rejected_and_state_untouched() {
        let mut state = ProfilesState::new();
        state.load(vec![perfil("1", "SP", "Campinas")]);
        let result = state.apply_state_filter(Some("XY"), &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(AppError::UnknownState(_))));
        assert_eq!(state.current().len(), 1);
    }

    #[test]
    fn city_filter_ignores_accents_and_case() {
        let mut state = ProfilesState::new();
        state.load(vec![
            perfil("1", "SP", "São José dos Campos"),
            perfil("2", "SP", "Campinas"),
            perfil("3", "SC", "São José"),
        ]);
        let filtered = state
            .apply_location_filter(Some("sp"), Some("sao jose dos campos"), &mut StdRng::seed_from_u64(9))
            .expect("filtro aplicado");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].nome, "1");
    }

    #[test]
    fn proximity_orders_city_then_state_then_rest() {
        let profiles = vec![
            perfil("longe", "BA", "Salvador"),
            perfil("estado", "SP", "Santos"),
            perfil("cidade", "SP", "Campinas"),
            perfil("longe2", "RJ", "Niterói"),
        ];
        let ordered = order_by_proximity(
            profiles,
            normalize_state("SP"),
            Some("campinas"),
            &mut StdRng::seed_from_u64(5),
        );
        let names: Vec<&str> = ordered.iter().map(|p| p.nome.as_str()).collect();
        assert_eq!(names[0], "cidade");
        assert_eq!(names[1], "estado");
        assert_eq!(names.len(), 4);
    }
}
