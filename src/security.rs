use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, Result};
use crate::models::Role;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Password Hashing
// =============================================================================

/// Hash a plaintext password with bcrypt
///
/// bcrypt is deliberately slow, so the work runs on the blocking pool
/// instead of an async worker thread.
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// Check a plaintext password against a stored bcrypt hash
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let matches = tokio::task::spawn_blocking(move || match bcrypt::verify(password, &hash) {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!("Stored password hash could not be verified: {}", e);
            false
        }
    })
    .await?;
    Ok(matches)
}

// =============================================================================
// Session Tokens
// =============================================================================

/// Identity carried by a verified session token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: i64,
    pub role: Role,
    /// Unix timestamp after which the token is rejected
    pub expires_at: i64,
}

/// Sign session claims into a token
///
/// # Format
/// `<user_id>:<role>:<expires_at>.<hex HMAC-SHA256 of the part before the dot>`
pub fn sign_session(claims: &SessionClaims, secret: &str) -> Result<String> {
    let payload = format!(
        "{}:{}:{}",
        claims.user_id,
        claims.role.as_str(),
        claims.expires_at
    );
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::InvalidInput("Session secret is unusable".to_string()))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("{}.{}", payload, signature))
}

/// Verify a session token and return its claims
///
/// Returns `None` for malformed tokens, bad signatures, unknown roles and
/// tokens whose expiry is not after `now`.
pub fn verify_session(token: &str, secret: &str, now: i64) -> Option<SessionClaims> {
    let (payload, signature) = token.rsplit_once('.')?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format in session token");
            return None;
        }
    };
    if mac.verify_slice(&sig_bytes).is_err() {
        tracing::warn!("Session token signature mismatch");
        return None;
    }

    let mut parts = payload.split(':');
    let user_id = parts.next()?.parse().ok()?;
    let role = parts.next()?.parse().ok()?;
    let expires_at: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    if expires_at <= now {
        tracing::debug!("Session token expired at {}", expires_at);
        return None;
    }

    Some(SessionClaims {
        user_id,
        role,
        expires_at,
    })
}
