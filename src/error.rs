use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{ERR_EMAIL_REGISTERED, ERR_INVALID_CREDENTIALS, ERR_NOT_ENOUGH_STOCK};

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Password hash error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Invalid credentials")]
    AuthenticationFailed,

    #[error("Login required")]
    Unauthenticated,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Email already registered")]
    DuplicateEmail,
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                internal()
            }
            AppError::Migration(ref e) => {
                tracing::error!("Migration error: {:?}", e);
                internal()
            }
            AppError::PasswordHash(ref e) => {
                tracing::error!("Password hash error: {:?}", e);
                internal()
            }
            AppError::TaskJoin(ref e) => {
                tracing::error!("Task join error: {:?}", e);
                internal()
            }
            AppError::AuthenticationFailed => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": ERR_INVALID_CREDENTIALS }),
            ),
            AppError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, json!({ "error": "Login required" }))
            }
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "error": "Insufficient permissions" }),
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("{} not found", what) }),
            ),
            AppError::InsufficientStock {
                requested,
                available,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": ERR_NOT_ENOUGH_STOCK,
                    "requested": requested,
                    "available": available,
                }),
            ),
            AppError::InvalidInput(ref msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            AppError::DuplicateEmail => {
                (StatusCode::CONFLICT, json!({ "error": ERR_EMAIL_REGISTERED }))
            }
        };

        (status, Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, serde_json::Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "Internal server error" }),
    )
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::AuthenticationFailed, StatusCode::UNAUTHORIZED),
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::NotFound("Medicine"), StatusCode::NOT_FOUND),
            (
                AppError::InsufficientStock {
                    requested: 5,
                    available: 2,
                },
                StatusCode::CONFLICT,
            ),
            (
                AppError::InvalidInput("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::DuplicateEmail, StatusCode::CONFLICT),
            (
                AppError::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            AppError::NotFound("Reservation").to_string(),
            "Reservation not found"
        );
    }
}
