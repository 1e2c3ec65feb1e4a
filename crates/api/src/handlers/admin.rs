//! Handlers for the `/admin/bookings` operator tooling.
//!
//! These endpoints run the same settlement path as the sweep; an operator
//! expiring a booking by hand and the sweep expiring it a minute later are
//! indistinguishable in the ledger.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use beautycita_core::distribution::Outcome;
use beautycita_core::error::CoreError;
use beautycita_core::lifecycle::ExpirationType;
use beautycita_core::types::{DbId, Timestamp};
use beautycita_db::models::booking::ExpirationStat;
use beautycita_db::repositories::BookingRepo;
use beautycita_events::{BOOKING_CANCELLED, BOOKING_EXPIRED};

use crate::engine::{publish_settled, CancelAudit, SettleResult, Settled, Settlement};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/bookings/{id}/expire`.
#[derive(Debug, Deserialize)]
pub struct ExpireBooking {
    /// `STYLIST_NO_RESPONSE` or `CLIENT_NO_CONFIRM`.
    pub expiration_type: String,
}

/// POST /api/v1/admin/bookings/{id}/expire
///
/// Manually expire a booking whose phase window should have lapsed,
/// through the same settlement path the sweep uses.
pub async fn expire(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ExpireBooking>,
) -> AppResult<Json<DataResponse<Settled>>> {
    let expiration = ExpirationType::parse(&input.expiration_type).map_err(AppError::Core)?;
    let outcome = match expiration {
        ExpirationType::StylistNoResponse => Outcome::StylistNoResponse,
        ExpirationType::ClientNoConfirm => Outcome::ClientNoConfirm,
    };

    match Settlement::apply(&state.pool, id, outcome, None, Utc::now()).await? {
        SettleResult::Applied(done) => {
            publish_settled(&state.event_bus, BOOKING_EXPIRED, &done, outcome);
            Ok(Json(DataResponse { data: *done }))
        }
        SettleResult::Skipped => Err(AppError::Core(CoreError::InvalidTransition(format!(
            "Booking {id} is not in the phase that {} expires",
            expiration.as_str()
        )))),
    }
}

/// Request body for `POST /admin/bookings/{id}/settle`.
#[derive(Debug, Deserialize)]
pub struct SettleBooking {
    /// `CLIENT_NO_SHOW` or `STYLIST_NO_SHOW`.
    pub outcome: String,
    /// The operator recording the outcome, for the cancellation audit.
    pub actor_user_id: DbId,
}

/// POST /api/v1/admin/bookings/{id}/settle
///
/// Apply a no-show outcome to a confirmed booking. `CLIENT_NO_SHOW` splits
/// the captured funds 60/40 between client and stylist; `STYLIST_NO_SHOW`
/// refunds the client in full (minus the platform fee).
pub async fn settle(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SettleBooking>,
) -> AppResult<Json<DataResponse<Settled>>> {
    let outcome = Outcome::parse(&input.outcome).map_err(AppError::Core)?;
    let reason = match outcome {
        Outcome::ClientNoShow => "Client did not show up",
        Outcome::StylistNoShow => "Stylist did not show up",
        other => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "{} is not an admin-settleable outcome",
                other.as_str()
            ))))
        }
    };

    let audit = CancelAudit {
        cancelled_by: input.actor_user_id,
        reason,
    };

    match Settlement::apply(&state.pool, id, outcome, Some(audit), Utc::now()).await? {
        SettleResult::Applied(done) => {
            publish_settled(&state.event_bus, BOOKING_CANCELLED, &done, outcome);
            Ok(Json(DataResponse { data: *done }))
        }
        SettleResult::Skipped => Err(AppError::Core(CoreError::InvalidTransition(format!(
            "Booking {id} is not confirmed; no-show outcomes need a confirmed booking"
        )))),
    }
}

/// Query parameters for `GET /admin/bookings/expiration-stats`.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// GET /api/v1/admin/bookings/expiration-stats?start&end
///
/// Count, average and total booking value grouped by expiration status in
/// the given range.
pub async fn expiration_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsQuery>,
) -> AppResult<Json<DataResponse<Vec<ExpirationStat>>>> {
    if params.end < params.start {
        return Err(AppError::Core(CoreError::Validation(
            "end must not be before start".into(),
        )));
    }
    let stats = BookingRepo::expiration_stats(&state.pool, params.start, params.end).await?;
    Ok(Json(DataResponse { data: stats }))
}
