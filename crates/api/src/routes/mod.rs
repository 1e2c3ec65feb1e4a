pub mod admin;
pub mod bookings;
pub mod credits;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /bookings                                 create (POST)
/// /bookings/mine                            list a user's bookings (GET)
/// /bookings/{id}                            get (GET)
/// /bookings/{id}/accept                     stylist accepts (POST)
/// /bookings/{id}/decline                    stylist declines (POST)
/// /bookings/{id}/confirm                    client confirms (POST)
/// /bookings/{id}/cancel                     policy-guarded cancel (POST)
/// /bookings/{id}/complete                   mark done, pay out (POST)
///
/// /credits/balance                          balance (GET)
/// /credits/history                          ledger history (GET)
/// /credits/withdrawals                      request withdrawal (POST)
///
/// /admin/bookings/{id}/expire               manual expiration (POST)
/// /admin/bookings/{id}/settle               no-show settlement (POST)
/// /admin/bookings/expiration-stats          aggregate stats (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/bookings", bookings::router())
        .nest("/credits", credits::router())
        .nest("/admin", admin::router())
}
