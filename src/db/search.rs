use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::contains_pattern;
use super::medicines::MEDICINE_COLUMNS;
use crate::error::Result;
use crate::models::{LocalityMap, Medicine};

/// Where a location search found its results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Stock found in the requested locality
    Exact,
    /// Nothing in the requested locality, stock found in its neighbors
    Nearby,
    /// Nothing in the locality or any neighbor searched
    NotFound,
}

/// Result of a location-aware medicine search
#[derive(Debug, Clone, Serialize)]
pub struct LocationSearch {
    pub outcome: SearchOutcome,
    /// Requested locality, in the table's spelling when it is a known one
    pub location: String,
    /// Neighbor localities that were searched after the exact search came up empty
    pub searched_neighbors: Vec<String>,
    pub medicines: Vec<Medicine>,
    pub message: Option<String>,
}

/// Search a locality for medicines by name, falling back to its neighbors
///
/// Name and locality both match case-insensitively. Result order is
/// whatever SQLite yields.
pub async fn search_by_location(
    pool: &SqlitePool,
    localities: &LocalityMap,
    name_query: &str,
    locality: &str,
) -> Result<LocationSearch> {
    let name_query = name_query.trim();
    let location = localities
        .resolve(locality)
        .map(str::to_string)
        .unwrap_or_else(|| locality.trim().to_string());

    let exact = find_in(pool, name_query, std::slice::from_ref(&location.as_str())).await?;
    if !exact.is_empty() {
        return Ok(LocationSearch {
            outcome: SearchOutcome::Exact,
            location,
            searched_neighbors: Vec::new(),
            medicines: exact,
            message: None,
        });
    }

    let Some(neighbors) = localities.neighbors(&location) else {
        tracing::debug!("No stock in unknown locality {}", location);
        return Ok(LocationSearch {
            outcome: SearchOutcome::NotFound,
            message: Some(format!("Medicine not found in {}.", location)),
            location,
            searched_neighbors: Vec::new(),
            medicines: Vec::new(),
        });
    };

    let nearby = find_in(pool, name_query, neighbors).await?;
    let searched_neighbors: Vec<String> = neighbors.iter().map(|n| n.to_string()).collect();

    let (outcome, message) = if nearby.is_empty() {
        (
            SearchOutcome::NotFound,
            format!(
                "Medicine not found in {} or its nearby locations.",
                location
            ),
        )
    } else {
        (
            SearchOutcome::Nearby,
            format!(
                "Medicine not found in {}. Showing results from nearby locations: {}.",
                location,
                neighbors.join(", ")
            ),
        )
    };

    tracing::debug!(
        "Location search for '{}' in {} fell back to neighbors: {:?}",
        name_query,
        location,
        outcome
    );

    Ok(LocationSearch {
        outcome,
        location,
        searched_neighbors,
        medicines: nearby,
        message: Some(message),
    })
}

async fn find_in(pool: &SqlitePool, name_query: &str, locations: &[&str]) -> Result<Vec<Medicine>> {
    if locations.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM medicines WHERE name LIKE ",
        MEDICINE_COLUMNS
    ));
    builder.push_bind(contains_pattern(name_query));
    builder.push(" ESCAPE '\\' AND location COLLATE NOCASE IN (");
    let mut separated = builder.separated(", ");
    for location in locations {
        separated.push_bind(location.to_string());
    }
    separated.push_unseparated(")");

    let rows = builder.build_query_as::<Medicine>().fetch_all(pool).await?;
    Ok(rows)
}
