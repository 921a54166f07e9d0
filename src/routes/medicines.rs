use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::session::UserSession;
use crate::db::{self, medicines, reservations, LocationSearch};
use crate::error::Result;
use crate::models::{LocalityMap, Medicine, Reservation, ReservationDetails};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    /// Inclusive cut-off, `YYYY-MM-DD`
    pub by: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct NameSearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct LocationSearchQuery {
    #[serde(default)]
    pub q: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct ReserveResponse {
    pub success: bool,
    pub message: String,
    pub reservation: Reservation,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub medicines: Vec<Medicine>,
    pub low_stock: Vec<Medicine>,
    pub expiring: Vec<Medicine>,
    pub expiring_by: NaiveDate,
    pub reservations: Vec<ReservationDetails>,
    pub nearby: LocalityMap,
}

/// First day of the current month, the default expiry cut-off
pub fn default_expiry_cutoff() -> NaiveDate {
    let today = Utc::now().date_naive();
    today.with_day(1).unwrap_or(today)
}

pub async fn list_medicines(State(state): State<AppState>) -> Result<Json<Vec<Medicine>>> {
    Ok(Json(medicines::list_medicines(&state.pool).await?))
}

pub async fn low_stock(
    State(state): State<AppState>,
    Query(params): Query<LowStockQuery>,
) -> Result<Json<Vec<Medicine>>> {
    let threshold = params
        .threshold
        .unwrap_or(state.config.low_stock_threshold);
    Ok(Json(medicines::low_stock(&state.pool, threshold).await?))
}

pub async fn expiring(
    State(state): State<AppState>,
    Query(params): Query<ExpiringQuery>,
) -> Result<Json<Vec<Medicine>>> {
    let cutoff = params.by.unwrap_or_else(default_expiry_cutoff);
    Ok(Json(medicines::expiring_by(&state.pool, cutoff).await?))
}

/// Name search across every location
pub async fn search_by_name(
    State(state): State<AppState>,
    Query(params): Query<NameSearchQuery>,
) -> Result<Json<Vec<Medicine>>> {
    Ok(Json(medicines::search_by_name(&state.pool, &params.q).await?))
}

/// Name search in one locality, falling back to its neighbors
pub async fn search_by_location(
    State(state): State<AppState>,
    _session: UserSession,
    Query(params): Query<LocationSearchQuery>,
) -> Result<Json<LocationSearch>> {
    let result =
        db::search_by_location(&state.pool, &state.localities, &params.q, &params.location)
            .await?;
    Ok(Json(result))
}

pub async fn localities(State(state): State<AppState>) -> Json<LocalityMap> {
    Json(state.localities.as_ref().clone())
}

/// Reserve stock of one medicine for the logged-in user
///
/// Returns 409 Conflict with the available quantity when stock is short.
pub async fn reserve(
    State(state): State<AppState>,
    session: UserSession,
    Path(medicine_id): Path<i64>,
    Json(payload): Json<ReserveRequest>,
) -> Result<Json<ReserveResponse>> {
    let reservation =
        reservations::reserve(&state.pool, session.user_id, medicine_id, payload.quantity).await?;

    Ok(Json(ReserveResponse {
        success: true,
        message: "Reservation successful!".to_string(),
        reservation,
    }))
}

pub async fn dashboard(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<DashboardResponse>> {
    let cutoff = default_expiry_cutoff();

    let medicines = medicines::list_medicines(&state.pool).await?;
    let low_stock = medicines::low_stock(&state.pool, state.config.low_stock_threshold).await?;
    let expiring = medicines::expiring_by(&state.pool, cutoff).await?;
    let reservations = reservations::reservations_for_user(&state.pool, session.user_id).await?;

    Ok(Json(DashboardResponse {
        medicines,
        low_stock,
        expiring,
        expiring_by: cutoff,
        reservations,
        nearby: state.localities.as_ref().clone(),
    }))
}
