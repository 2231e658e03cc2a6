// src/location/geoip.rs

use std::{net::IpAddr, sync::Arc, time::Duration};

use serde::Deserialize;

use crate::{location::estados::normalize_state, models::location::LocationResponse};

// Provedores de geolocalização por IP, consultados em ordem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoProviderKind {
    // Formato ipapi.co: /{ip}/json/
    IpapiCo,
    // Formato ip-api.com: /json/{ip}
    IpApiCom,
}

#[derive(Debug, Clone)]
pub struct GeoProvider {
    pub kind: GeoProviderKind,
    pub base_url: String,
}

impl GeoProvider {
    pub fn new(kind: GeoProviderKind, base_url: impl Into<String>) -> Self {
        Self { kind, base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            GeoProviderKind::IpapiCo => "ipapi.co",
            GeoProviderKind::IpApiCom => "ip-api.com",
        }
    }

    fn url(&self, ip: Option<IpAddr>) -> String {
        match (self.kind, ip) {
            (GeoProviderKind::IpapiCo, Some(ip)) => format!("{}/{}/json/", self.base_url, ip),
            (GeoProviderKind::IpapiCo, None) => format!("{}/json/", self.base_url),
            (GeoProviderKind::IpApiCom, Some(ip)) => format!("{}/json/{}?fields={}", self.base_url, ip, IP_API_FIELDS),
            (GeoProviderKind::IpApiCom, None) => format!("{}/json?fields={}", self.base_url, IP_API_FIELDS),
        }
    }
}

const IP_API_FIELDS: &str = "status,message,countryCode,region,regionName,city,query";

#[derive(Debug, Deserialize)]
struct IpapiCoResponse {
    ip: Option<String>,
    region: Option<String>,
    region_code: Option<String>,
    city: Option<String>,
    country_code: Option<String>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiComResponse {
    status: String,
    message: Option<String>,
    query: Option<String>,
    region: Option<String>,
    region_name: Option<String>,
    city: Option<String>,
    country_code: Option<String>,
}

// Resultado bruto, já no formato comum aos dois provedores
#[derive(Debug, Default, PartialEq)]
struct GeoLookup {
    ip: Option<String>,
    region_name: Option<String>,
    region_code: Option<String>,
    city: Option<String>,
    country_code: Option<String>,
}

#[derive(Clone)]
pub struct LocationService {
    client: reqwest::Client,
    providers: Arc<Vec<GeoProvider>>,
}

impl LocationService {
    pub fn new(providers: Vec<GeoProvider>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("classificados-backend/0.1")
            .build()?;
        Ok(Self { client, providers: Arc::new(providers) })
    }

    /// Consulta os provedores em sequência; o primeiro que devolver uma UF válida vence.
    pub async fn detect(&self, client_ip: Option<IpAddr>) -> LocationResponse {
        // IP local/privado: deixa o provedor usar o IP de saída
        let ip = client_ip.filter(is_public_ip);
        let ip_text = client_ip.map(|ip| ip.to_string());

        for provider in self.providers.iter() {
            match self.lookup(provider, ip).await {
                Ok(lookup) => {
                    if let Some(location) = resolve(lookup, provider.name()) {
                        tracing::info!(
                            "📍 Localização detectada via {}: {:?}/{:?}",
                            provider.name(),
                            location.estado,
                            location.cidade
                        );
                        return location;
                    }
                    tracing::warn!("⚠️ {} não retornou um estado brasileiro reconhecido", provider.name());
                }
                Err(e) => {
                    tracing::warn!("⚠️ Falha ao consultar {}: {}", provider.name(), e);
                }
            }
        }

        tracing::warn!("⚠️ Nenhum provedor de geolocalização respondeu para {:?}", ip_text);
        LocationResponse::falha(ip_text)
    }

    async fn lookup(&self, provider: &GeoProvider, ip: Option<IpAddr>) -> anyhow::Result<GeoLookup> {
        let response = self
            .client
            .get(provider.url(ip))
            .send()
            .await?
            .error_for_status()?;

        match provider.kind {
            GeoProviderKind::IpapiCo => {
                let body: IpapiCoResponse = response.json().await?;
                if body.error {
                    anyhow::bail!("ipapi.co: {}", body.reason.unwrap_or_default());
                }
                Ok(GeoLookup {
                    ip: body.ip,
                    region_name: body.region,
                    region_code: body.region_code,
                    city: body.city,
                    country_code: body.country_code,
                })
            }
            GeoProviderKind::IpApiCom => {
                let body: IpApiComResponse = response.json().await?;
                if body.status != "success" {
                    anyhow::bail!("ip-api.com: {}", body.message.unwrap_or(body.status));
                }
                Ok(GeoLookup {
                    ip: body.query,
                    region_name: body.region_name,
                    region_code: body.region,
                    city: body.city,
                    country_code: body.country_code,
                })
            }
        }
    }
}

fn resolve(lookup: GeoLookup, fonte: &str) -> Option<LocationResponse> {
    if let Some(country) = lookup.country_code.as_deref() {
        if !country.eq_ignore_ascii_case("BR") {
            return None;
        }
    }

    let estado = lookup
        .region_name
        .as_deref()
        .and_then(normalize_state)
        .or_else(|| lookup.region_code.as_deref().and_then(normalize_state))?;

    // No DF a "cidade" devolvida é a região administrativa; descartamos.
    let cidade = if estado.is_distrito_federal() {
        None
    } else {
        lookup.city.filter(|c| !c.trim().is_empty())
    };

    Some(LocationResponse {
        sucesso: true,
        ip: lookup.ip,
        estado: Some(estado.sigla.to_string()),
        estado_nome: Some(estado.nome.to_string()),
        cidade,
        fonte: Some(fonte.to_string()),
    })
}

fn is_public_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => !(v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()),
        IpAddr::V6(v6) => !(v6.is_loopback() || v6.is_unspecified() || (v6.segments()[0] & 0xfe00) == 0xfc00),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_normalizes_region_name() {
        let location = resolve(
            GeoLookup {
                ip: Some("200.1.1.1".into()),
                region_name: Some("Sao Paulo".into()),
                region_code: Some("SP".into()),
                city: Some("Campinas".into()),
                country_code: Some("BR".into()),
            },
            "ipapi.co",
        )
        .expect("localização");
        assert!(location.sucesso);
        assert_eq!(location.estado.as_deref(), Some("SP"));
        assert_eq!(location.cidade.as_deref(), Some("Campinas"));
    }

    #[test]
    fn resolve_drops_city_for_distrito_federal() {
        let location = resolve(
            GeoLookup {
                region_name: Some("Federal District".into()),
                city: Some("Brasília".into()),
                country_code: Some("BR".into()),
                ..GeoLookup::default()
            },
            "ip-api.com",
        )
        .expect("localização");
        assert_eq!(location.estado.as_deref(), Some("DF"));
        assert_eq!(location.cidade, None);
    }

    #[test]
    fn resolve_rejects_foreign_country() {
        let lookup = GeoLookup {
            region_name: Some("California".into()),
            region_code: Some("CA".into()),
            country_code: Some("US".into()),
            ..GeoLookup::default()
        };
        assert!(resolve(lookup, "ipapi.co").is_none());
    }

    #[test]
    fn private_addresses_are_not_public() {
        assert!(!is_public_ip(&"127.0.0.1".parse().expect("ip")));
        assert!(!is_public_ip(&"192.168.0.10".parse().expect("ip")));
        assert!(!is_public_ip(&"::1".parse().expect("ip")));
        assert!(is_public_ip(&"200.147.67.142".parse().expect("ip")));
    }

    #[test]
    fn provider_urls_follow_each_format() {
        let ip: IpAddr = "200.147.67.142".parse().expect("ip");
        let primary = GeoProvider::new(GeoProviderKind::IpapiCo, "https://ipapi.co/");
        assert_eq!(primary.url(Some(ip)), "https://ipapi.co/200.147.67.142/json/");
        let fallback = GeoProvider::new(GeoProviderKind::IpApiCom, "http://ip-api.com");
        assert!(fallback.url(None).starts_with("http://ip-api.com/json?fields="));
    }
}
