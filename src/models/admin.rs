// src/models/admin.rs

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_anuncios: usize,
    pub por_status: BTreeMap<String, usize>,
    // Chave = sigla da UF; anúncios sem estado reconhecido vão em "??"
    pub por_estado: BTreeMap<String, usize>,
    pub por_categoria: BTreeMap<String, usize>,
    pub verificados: usize,
    pub total_usuarios: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EstadoCount {
    #[schema(example = "SP")]
    pub sigla: String,
    #[schema(example = "São Paulo")]
    pub nome: String,
    pub total: usize,
}
