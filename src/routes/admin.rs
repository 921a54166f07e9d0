use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::session::AdminSession;
use crate::constants::ERR_NO_MEDICINES_SELECTED;
use crate::db::medicines::{self, ImportSummary};
use crate::db::reservations;
use crate::error::{AppError, Result};
use crate::models::{LineError, Medicine, MedicineFields, ReleasedReservation, ReservationDetails};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminDashboardQuery {
    pub shop_search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboardResponse {
    pub medicines: Vec<Medicine>,
    pub reservations: Vec<ReservationDetails>,
}

#[derive(Debug, Deserialize)]
pub struct ShopSearchQuery {
    #[serde(default)]
    pub shop: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSelectedRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct DeleteSelectedResponse {
    pub success: bool,
    pub deleted: u64,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// One `name, quantity, YYYY-MM-DD, shop, location` record per line
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub added: usize,
    pub errors: Vec<LineError>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Admin dashboard
///
/// GET /api/admin/dashboard?shop_search=<substring>
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(params): Query<AdminDashboardQuery>,
) -> Result<Json<AdminDashboardResponse>> {
    let medicines = match params.shop_search.as_deref().map(str::trim) {
        Some(shop) if !shop.is_empty() => medicines::search_by_shop(&state.pool, shop).await?,
        _ => medicines::list_medicines(&state.pool).await?,
    };
    let reservations = reservations::list_reservations(&state.pool).await?;

    Ok(Json(AdminDashboardResponse {
        medicines,
        reservations,
    }))
}

pub async fn add_medicine(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(fields): Json<MedicineFields>,
) -> Result<Json<Medicine>> {
    Ok(Json(medicines::add_medicine(&state.pool, fields).await?))
}

pub async fn update_medicine(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<i64>,
    Json(fields): Json<MedicineFields>,
) -> Result<Json<Medicine>> {
    let medicine = medicines::update_medicine(&state.pool, id, fields).await?;
    tracing::info!("Updated medicine {}", id);
    Ok(Json(medicine))
}

pub async fn delete_medicine(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>> {
    medicines::delete_medicine(&state.pool, id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Delete every selected medicine
///
/// Ids that no longer exist are skipped; an empty selection is rejected.
pub async fn delete_selected(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(payload): Json<DeleteSelectedRequest>,
) -> Result<Json<DeleteSelectedResponse>> {
    if payload.ids.is_empty() {
        return Err(AppError::InvalidInput(ERR_NO_MEDICINES_SELECTED.to_string()));
    }

    let deleted = medicines::delete_medicines(&state.pool, &payload.ids).await?;
    Ok(Json(DeleteSelectedResponse {
        success: true,
        deleted,
    }))
}

/// Mass import from pasted text
///
/// Malformed lines are reported back and do not block the valid ones.
pub async fn import_medicines(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportResponse>> {
    let ImportSummary { added, errors } = medicines::import_medicines(&state.pool, &payload.data).await?;

    Ok(Json(ImportResponse {
        success: true,
        message: format!("Mass add complete. {} medicines added.", added),
        added,
        errors,
    }))
}

pub async fn search_by_shop(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(params): Query<ShopSearchQuery>,
) -> Result<Json<Vec<Medicine>>> {
    Ok(Json(medicines::search_by_shop(&state.pool, &params.shop).await?))
}

pub async fn list_reservations(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<Vec<ReservationDetails>>> {
    Ok(Json(reservations::list_reservations(&state.pool).await?))
}

/// Remove a reservation and return its stock to the medicine, if it still exists
pub async fn delete_reservation(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<i64>,
) -> Result<Json<ReleasedReservation>> {
    Ok(Json(reservations::delete_reservation(&state.pool, id).await?))
}
