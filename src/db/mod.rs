//! Persistence: pool setup, migrations and the queries behind every operation.

pub mod medicines;
pub mod pool;
pub mod reservations;
pub mod search;
pub mod users;

pub use pool::create_pool;
pub use search::{search_by_location, LocationSearch, SearchOutcome};

use sqlx::SqlitePool;

/// Apply the bundled schema migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Migrations complete");
    Ok(())
}

/// Build a LIKE pattern matching `needle` anywhere, with wildcards escaped
///
/// Pair with `ESCAPE '\'` in the query.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
