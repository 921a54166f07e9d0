use std::env;

use crate::constants::{DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_SESSION_TTL_SECS};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    pub session_secret: String,
    pub session_ttl_secs: i64,
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,
    pub bcrypt_cost: u32,
    pub low_stock_threshold: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/medstock.db".to_string());

        let allowed_origins = parse_origins(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
        );

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET must be set for signing session tokens")?;

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_SESSION_TTL_SECS.to_string())
            .parse()
            .map_err(|_| "Invalid SESSION_TTL_SECS")?;

        let admin_username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_email =
            env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@medstock.local".to_string());
        let admin_password = env::var("ADMIN_PASSWORD")
            .map_err(|_| "ADMIN_PASSWORD must be set to seed the admin account")?;

        let bcrypt_cost = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
            .parse()
            .map_err(|_| "Invalid BCRYPT_COST")?;

        let low_stock_threshold = env::var("LOW_STOCK_THRESHOLD")
            .unwrap_or_else(|_| DEFAULT_LOW_STOCK_THRESHOLD.to_string())
            .parse()
            .map_err(|_| "Invalid LOW_STOCK_THRESHOLD")?;

        Ok(Config {
            server_host,
            server_port,
            database_url,
            allowed_origins,
            environment,
            session_secret,
            session_ttl_secs,
            admin_username,
            admin_email,
            admin_password,
            bcrypt_cost,
            low_stock_threshold,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_trims_and_skips_empty() {
        let origins = parse_origins(" http://a.test , ,http://b.test,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_server_address() {
        let config = Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 9000,
            database_url: "sqlite::memory:".to_string(),
            allowed_origins: vec![],
            environment: "test".to_string(),
            session_secret: "secret".to_string(),
            session_ttl_secs: 60,
            admin_username: "admin".to_string(),
            admin_email: "admin@test".to_string(),
            admin_password: "pw".to_string(),
            bcrypt_cost: 4,
            low_stock_threshold: 8,
        };
        assert_eq!(config.server_address(), "127.0.0.1:9000");
    }
}
