//! Route definitions for the `/bookings` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::bookings;
use crate::state::AppState;

/// Routes mounted at `/bookings`.
///
/// ```text
/// POST /                    -> create
/// GET  /mine                -> mine  (?user_id&role)
/// GET  /{id}                -> get_one
/// POST /{id}/accept         -> accept
/// POST /{id}/decline        -> decline
/// POST /{id}/confirm        -> confirm
/// POST /{id}/cancel         -> cancel
/// POST /{id}/complete       -> complete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(bookings::create))
        .route("/mine", get(bookings::mine))
        .route("/{id}", get(bookings::get_one))
        .route("/{id}/accept", post(bookings::accept))
        .route("/{id}/decline", post(bookings::decline))
        .route("/{id}/confirm", post(bookings::confirm))
        .route("/{id}/cancel", post(bookings::cancel))
        .route("/{id}/complete", post(bookings::complete))
}
