//! Medstock Server Library
//!
//! Medicine inventory across local shops, stock reservations and
//! location-aware search. This module exports the core types and functions
//! for testing and reuse.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;

pub use config::Config;
pub use error::{AppError, Result};
pub use models::LocalityMap;

use sqlx::SqlitePool;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub localities: Arc<LocalityMap>,
}

impl AppState {
    /// Create a new AppState with the built-in locality table
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            config,
            localities: Arc::new(LocalityMap::builtin()),
        }
    }
}
