// src/middleware/client_ip.rs

use std::{convert::Infallible, net::{IpAddr, SocketAddr}};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};

use crate::config::AppState;

/// IP do cliente. Headers de proxy só valem com `TRUSTED_PROXY_HEADERS`;
/// sem isso, o endereço do socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

const PROXY_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

pub fn ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    PROXY_HEADERS.iter().find_map(|name| {
        let value = headers.get(*name)?.to_str().ok()?;
        // x-forwarded-for: "cliente, proxy1, proxy2"
        value.split(',').next()?.trim().parse().ok()
    })
}

pub fn resolve_client_ip(headers: &HeaderMap, socket: Option<SocketAddr>, trust_proxy_headers: bool) -> Option<IpAddr> {
    let forwarded = if trust_proxy_headers { ip_from_headers(headers) } else { None };
    forwarded.or_else(|| socket.map(|addr| addr.ip()))
}

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let socket = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientIp(resolve_client_ip(&parts.headers, socket, state.settings.trust_proxy_headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_first_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("200.1.2.3, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(ip_from_headers(&headers), "200.1.2.3".parse().ok());
    }

    #[test]
    fn falls_back_through_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("lixo"));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("2804:14c::1"));
        assert_eq!(ip_from_headers(&headers), "2804:14c::1".parse().ok());
        assert_eq!(ip_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn untrusted_headers_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("200.1.2.3"));
        let socket: SocketAddr = "177.10.0.5:40000".parse().expect("socket");

        assert_eq!(resolve_client_ip(&headers, Some(socket), false), Some(socket.ip()));
        assert_eq!(resolve_client_ip(&headers, None, false), None);
        assert_eq!(resolve_client_ip(&headers, Some(socket), true), "200.1.2.3".parse().ok());
        assert_eq!(resolve_client_ip(&HeaderMap::new(), Some(socket), true), Some(socket.ip()));
    }
}
