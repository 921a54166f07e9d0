use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;

use crate::constants::SESSION_COOKIE;
use crate::error::AppError;
use crate::models::Role;
use crate::security::{verify_session, SessionClaims};
use crate::AppState;

/// Any authenticated caller
#[derive(Debug, Clone, Copy)]
pub(crate) struct Session(pub(crate) SessionClaims);

/// Authenticated caller with the `user` role
#[derive(Debug, Clone, Copy)]
pub struct UserSession {
    pub user_id: i64,
}

/// Authenticated caller with the `admin` role
#[derive(Debug, Clone, Copy)]
pub struct AdminSession {
    pub user_id: i64,
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AppError::Unauthenticated)?;
        let claims = verify_session(&token, &state.config.session_secret, Utc::now().timestamp())
            .ok_or(AppError::Unauthenticated)?;
        Ok(Session(claims))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UserSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Session(claims) = Session::from_request_parts(parts, state).await?;
        require_role(&claims, Role::User)?;
        Ok(UserSession {
            user_id: claims.user_id,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Session(claims) = Session::from_request_parts(parts, state).await?;
        require_role(&claims, Role::Admin)?;
        Ok(AdminSession {
            user_id: claims.user_id,
        })
    }
}

fn require_role(claims: &SessionClaims, role: Role) -> Result<(), AppError> {
    if claims.role != role {
        tracing::warn!(
            "User {} with role {} denied {} action",
            claims.user_id,
            claims.role,
            role
        );
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Session token from `Authorization: Bearer`, falling back to the session cookie
fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        let auth = auth.trim();
        if let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
        {
            return Some(token.trim().to_string());
        }
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

/// Cookie carrying a freshly signed session token
pub fn session_cookie(token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Already-expired session cookie; the client drops whatever it holds
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; medstock_session=tok.sig"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("tok.sig"));
    }

    #[test]
    fn test_no_token() {
        assert!(session_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_require_role() {
        let claims = SessionClaims {
            user_id: 1,
            role: Role::User,
            expires_at: 0,
        };
        assert!(require_role(&claims, Role::User).is_ok());
        assert!(matches!(
            require_role(&claims, Role::Admin),
            Err(AppError::Forbidden)
        ));
    }
}
