use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::session::{clear_session_cookie, session_cookie};
use crate::db::users;
use crate::error::{AppError, Result};
use crate::models::{Role, User};
use crate::security::{hash_password, sign_session, verify_password, SessionClaims};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    /// Required for admin logins, ignored otherwise
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub expires_at: i64,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Register a new account with the `user` role
///
/// Returns 409 Conflict if the email is already registered.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let username = payload.username.trim();
    let email = payload.email.trim();

    if username.is_empty() {
        return Err(AppError::InvalidInput("username must not be empty".to_string()));
    }
    if !User::validate_email(email) {
        tracing::warn!("Rejected registration with malformed email: {}", email);
        return Err(AppError::InvalidInput("email is not valid".to_string()));
    }
    if payload.password.is_empty() {
        return Err(AppError::InvalidInput("password must not be empty".to_string()));
    }

    let hash = hash_password(&payload.password, state.config.bcrypt_cost).await?;
    let user = users::create_user(&state.pool, username, email, &hash, Role::User).await?;

    tracing::info!("Registered user {} ({})", user.id, user.email);

    Ok(Json(RegisterResponse {
        success: true,
        user,
    }))
}

/// Log in as a user or admin
///
/// The account is looked up by email and the requested role. Admins must
/// also send their username. Every mismatch gives the same 401 response.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let email = payload.email.trim();

    let Some(user) = users::find_by_email_and_role(&state.pool, email, payload.role).await? else {
        tracing::warn!("Login failed for {} as {}: no such account", email, payload.role);
        return Err(AppError::AuthenticationFailed);
    };

    if !verify_password(&payload.password, &user.password_hash).await? {
        tracing::warn!("Login failed for {} as {}: wrong password", email, payload.role);
        return Err(AppError::AuthenticationFailed);
    }

    if user.role == Role::Admin
        && payload.username.as_deref().map(str::trim) != Some(user.username.as_str())
    {
        tracing::warn!("Admin login failed for {}: username missing or mismatched", email);
        return Err(AppError::AuthenticationFailed);
    }

    let claims = SessionClaims {
        user_id: user.id,
        role: user.role,
        expires_at: Utc::now().timestamp() + state.config.session_ttl_secs,
    };
    let token = sign_session(&claims, &state.config.session_secret)?;

    tracing::info!("User {} logged in as {}", user.id, user.role);

    let jar = jar.add(session_cookie(token.clone(), state.config.session_ttl_secs));
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            token,
            expires_at: claims.expires_at,
            user,
        }),
    ))
}

/// Clear the session cookie
///
/// Tokens are stateless, so a copied token stays valid until it expires.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    let jar = jar.add(clear_session_cookie());
    (jar, Json(LogoutResponse { success: true }))
}
