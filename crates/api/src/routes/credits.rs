//! Route definitions for the `/credits` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::credits;
use crate::state::AppState;

/// Routes mounted at `/credits`.
///
/// ```text
/// GET  /balance       -> balance   (?user_id)
/// GET  /history       -> history   (?user_id&limit&offset)
/// POST /withdrawals   -> request_withdrawal
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/balance", get(credits::balance))
        .route("/history", get(credits::history))
        .route("/withdrawals", post(credits::request_withdrawal))
}
