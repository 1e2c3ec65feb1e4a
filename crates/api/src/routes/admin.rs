//! Route definitions for the `/admin` operator tooling.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST /bookings/{id}/expire            -> expire
/// POST /bookings/{id}/settle            -> settle
/// GET  /bookings/expiration-stats       -> expiration_stats  (?start&end)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings/{id}/expire", post(admin::expire))
        .route("/bookings/{id}/settle", post(admin::settle))
        .route("/bookings/expiration-stats", get(admin::expiration_stats))
}
