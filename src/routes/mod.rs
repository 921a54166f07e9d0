pub mod admin;
pub mod auth;
pub mod health;
pub mod medicines;
pub mod session;

pub use auth::{login, logout, register};
pub use health::health_check;
pub use session::{AdminSession, UserSession};

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::AppState;

/// Every API route, bound to the shared state
pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/medicines", post(admin::add_medicine))
        .route(
            "/medicines/:id",
            put(admin::update_medicine).delete(admin::delete_medicine),
        )
        .route("/medicines/delete", post(admin::delete_selected))
        .route("/medicines/import", post(admin::import_medicines))
        .route("/medicines/search", get(admin::search_by_shop))
        .route("/reservations", get(admin::list_reservations))
        .route("/reservations/:id", delete(admin::delete_reservation));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/medicines", get(medicines::list_medicines))
        .route("/api/medicines/low-stock", get(medicines::low_stock))
        .route("/api/medicines/expiring", get(medicines::expiring))
        .route("/api/medicines/:id/reserve", post(medicines::reserve))
        .route("/api/search", get(medicines::search_by_name))
        .route("/api/search/location", get(medicines::search_by_location))
        .route("/api/localities", get(medicines::localities))
        .route("/api/dashboard", get(medicines::dashboard))
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
