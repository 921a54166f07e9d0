use sqlx::SqlitePool;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Role, User};
use crate::security::hash_password;

const USER_COLUMNS: &str = "id, username, email, password_hash, role";

/// Insert a new user; fails with `DuplicateEmail` when the email is taken
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<User> {
    if find_by_email(pool, email).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }

    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, role) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .execute(pool)
    .await
    .map_err(|e| match e {
        // Lost a race with a concurrent registration for the same email
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::DuplicateEmail,
        other => AppError::Database(other),
    })?;

    Ok(User {
        id: result.last_insert_rowid(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        role,
    })
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Lookup used by login: the account must exist with exactly this role
pub async fn find_by_email_and_role(
    pool: &SqlitePool,
    email: &str,
    role: Role,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = ? AND role = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .bind(role)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Seed the configured admin account unless its email already exists
///
/// Returns true when a new admin was inserted.
pub async fn ensure_admin(pool: &SqlitePool, config: &Config) -> Result<bool> {
    if find_by_email(pool, &config.admin_email).await?.is_some() {
        tracing::debug!("Admin account already present");
        return Ok(false);
    }

    let hash = hash_password(&config.admin_password, config.bcrypt_cost).await?;
    create_user(
        pool,
        &config.admin_username,
        &config.admin_email,
        &hash,
        Role::Admin,
    )
    .await?;

    tracing::info!("Seeded admin account {}", config.admin_email);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_pool;

    async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let (_dir, pool) = test_pool().await;

        let user = create_user(&pool, "anu", "anu@example.com", "hash", Role::User)
            .await
            .unwrap();

        let found = find_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(found.email, "anu@example.com");
        assert_eq!(found.role, Role::User);

        assert!(find_by_email_and_role(&pool, "anu@example.com", Role::Admin)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (_dir, pool) = test_pool().await;

        create_user(&pool, "anu", "anu@example.com", "hash", Role::User)
            .await
            .unwrap();
        let second = create_user(&pool, "other", "anu@example.com", "hash2", Role::User).await;
        assert!(matches!(second, Err(AppError::DuplicateEmail)));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let (_dir, pool) = test_pool().await;
        let config = Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            database_url: String::new(),
            allowed_origins: vec![],
            environment: "test".to_string(),
            session_secret: "secret".to_string(),
            session_ttl_secs: 60,
            admin_username: "admin".to_string(),
            admin_email: "admin@medstock.test".to_string(),
            admin_password: "pw".to_string(),
            bcrypt_cost: 4,
            low_stock_threshold: 8,
        };

        assert!(ensure_admin(&pool, &config).await.unwrap());
        assert!(!ensure_admin(&pool, &config).await.unwrap());

        let admin = find_by_email_and_role(&pool, "admin@medstock.test", Role::Admin)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.username, "admin");
        assert!(bcrypt::verify("pw", &admin.password_hash).unwrap());
    }
}
