use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Medicine, User};

/// Reservation row
///
/// `medicine_id` is a logical reference only: medicines can be deleted while
/// reservations against them remain.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Reservation {
    pub id: i64,
    pub user_id: i64,
    pub medicine_id: i64,
    pub reserved_quantity: i64,
    pub reservation_date: DateTime<Utc>,
}

/// Reservation joined with whatever still exists of its user and medicine
#[derive(Debug, Clone, Serialize)]
pub struct ReservationDetails {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub user: Option<User>,
    pub medicine: Option<Medicine>,
}

/// Outcome of removing a reservation
#[derive(Debug, Clone, Serialize)]
pub struct ReleasedReservation {
    pub reservation: Reservation,
    /// False when the medicine was already gone and no stock was returned
    pub stock_restored: bool,
}
