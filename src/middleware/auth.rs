// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{common::error::AppError, config::AppState, models::auth::User};

/// Cookie com o JWT (alternativa ao header Authorization).
pub const TOKEN_COOKIE: &str = "token";

/// Cookie HttpOnly com o JWT, gravado no login/cadastro.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Usuário autenticado, inserido nos extensions pelo `auth_guard`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Bearer no header tem prioridade sobre o cookie.
pub fn extract_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    from_header
        .or_else(|| jar.get(TOKEN_COOKIE).map(|cookie| cookie.value().to_string()))
        .filter(|token| !token.is_empty())
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

// Navegador vai para /login; cliente de API recebe 401 em JSON.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let result = match extract_token(request.headers(), &jar) {
        Some(token) => app_state.auth_service.validate_token(&token).await,
        None => Err(AppError::InvalidToken),
    };

    match result {
        Ok(user) => {
            request.extensions_mut().insert(AuthenticatedUser(user));
            next.run(request).await
        }
        Err(err @ (AppError::InvalidToken | AppError::AccountDisabled)) => {
            if wants_html(request.headers()) {
                tracing::debug!("🔒 Sem sessão válida, redirecionando para /login: {}", request.uri());
                Redirect::to("/login").into_response()
            } else {
                err.into_response()
            }
        }
        Err(err) => err.into_response(),
    }
}

// Extrator para obter o usuário autenticado diretamente nos handlers
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

/// Usuário opcional em rotas públicas: sem token (ou token inválido) vira `None`.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(AuthenticatedUser(user)) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(MaybeUser(Some(user.clone())));
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = extract_token(&parts.headers, &jar) else {
            return Ok(MaybeUser(None));
        };

        match state.auth_service.validate_token(&token).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::InvalidToken | AppError::AccountDisabled) => Ok(MaybeUser(None)),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        let jar = CookieJar::new().add(Cookie::new(TOKEN_COOKIE, "xyz"));
        assert_eq!(extract_token(&headers, &jar).as_deref(), Some("abc"));
        assert_eq!(extract_token(&HeaderMap::new(), &jar).as_deref(), Some("xyz"));
        assert_eq!(extract_token(&HeaderMap::new(), &CookieJar::new()), None);
    }

    #[test]
    fn html_detection_uses_accept_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));
        assert!(wants_html(&headers));
        assert!(!wants_html(&HeaderMap::new()));
    }
}
