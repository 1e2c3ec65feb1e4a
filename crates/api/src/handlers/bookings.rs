//! Handlers for the `/bookings` resource: the booking lifecycle actions.
//!
//! Accept and confirm share a pattern: evaluate the pure deadline guard,
//! and when the guard says the window already lapsed, settle the booking
//! as expired on the spot (the sweep would do the same a tick later) and
//! answer with `DeadlineExceeded`. The client never observes a stale
//! "still pending" booking that can no longer be acted on.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use beautycita_core::distribution::{self, Outcome};
use beautycita_core::error::CoreError;
use beautycita_core::lifecycle::{
    decide_accept, decide_confirm, decide_decline, AcceptDecision, BookingStatus, ConfirmDecision,
};
use beautycita_core::policy::{decide_cancel, CancelRole, RefundDisposition};
use beautycita_core::types::DbId;
use beautycita_db::models::booking::{Booking, CreateBooking, MyBookingsQuery, NewBooking};
use beautycita_db::models::payment::PaymentStatus;
use beautycita_db::repositories::{BookingRepo, PaymentRepo};
use beautycita_events::{
    BookingEvent, BOOKING_ACCEPTED, BOOKING_CANCELLED, BOOKING_COMPLETED, BOOKING_CONFIRMED,
    BOOKING_CREATED, BOOKING_DECLINED, BOOKING_EXPIRED,
};

use crate::engine::{publish_settled, CancelAudit, SettleResult, Settlement};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/bookings
///
/// Create a booking request. With a `payment_intent_id` the booking enters
/// the payment-first flow: status `PENDING_STYLIST_APPROVAL` and a total
/// confirmation window fixed at creation. Without one it enters the
/// standard flow as `PENDING`.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<DataResponse<Booking>>)> {
    // Referenced rows must exist and be active.
    if !BookingRepo::user_is_active(&state.pool, input.client_id, "CLIENT").await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Client",
            id: input.client_id,
        }));
    }
    if !BookingRepo::stylist_is_active(&state.pool, input.stylist_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Stylist",
            id: input.stylist_id,
        }));
    }
    let service = BookingRepo::find_active_service(&state.pool, input.service_id, input.stylist_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Service",
            id: input.service_id,
        }))?;

    if !BookingRepo::slot_is_free(&state.pool, input.stylist_id, input.booking_date, input.booking_time)
        .await?
    {
        return Err(AppError::Core(CoreError::Conflict(
            "The stylist already has a booking at this date and time".into(),
        )));
    }

    let now = Utc::now();
    let windows = &state.config.windows;

    // Both flows share the stylist-response deadline; the payment-first
    // flow additionally fixes the total confirmation deadline at creation.
    let (status, acceptance_expires_at) = if input.payment_intent_id.is_some() {
        (
            BookingStatus::PendingStylistApproval,
            Some(now + windows.payment_first_total),
        )
    } else {
        (BookingStatus::Pending, None)
    };

    let booking = BookingRepo::create(
        &state.pool,
        &NewBooking {
            client_id: input.client_id,
            stylist_id: input.stylist_id,
            service_id: input.service_id,
            booking_date: input.booking_date,
            booking_time: input.booking_time,
            duration_minutes: service.duration_minutes,
            status,
            total_price: service.price,
            notes: input.notes,
            payment_intent_id: input.payment_intent_id,
            request_expires_at: now + windows.request,
            acceptance_expires_at,
        },
    )
    .await?;

    state.event_bus.publish(
        BookingEvent::new(BOOKING_CREATED)
            .for_booking(booking.id)
            .notify_user(booking.client_id)
            .with_payload(serde_json::json!({
                "status": &booking.status,
                "service_name": service.name,
                "request_expires_at": booking.request_expires_at,
            })),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: booking }),
    ))
}

/// POST /api/v1/bookings/{id}/accept
///
/// Stylist accepts a pending request. A lapsed request window settles the
/// booking as `STYLIST_NO_RESPONSE` and answers 410.
pub async fn accept(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let now = Utc::now();
    let mut tx = state.pool.begin().await?;

    // Same row-lock discipline as confirm and cancel: the guard runs on
    // the locked row, so a sweep tick settling this booking cannot
    // interleave between the read and the update.
    let booking = BookingRepo::lock_by_id(&mut tx, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Booking",
            id,
        }))?;

    let decision = decide_accept(
        booking.status().map_err(AppError::Core)?,
        booking.request_expires_at,
        booking.acceptance_expires_at,
        now,
        &state.config.windows,
    )
    .map_err(AppError::Core)?;

    let acceptance_expires_at = match decision {
        AcceptDecision::Accepted {
            acceptance_expires_at,
        } => acceptance_expires_at,
        AcceptDecision::RequestExpired => {
            tx.rollback().await?;
            return Err(settle_lapsed(&state, id, Outcome::StylistNoResponse).await);
        }
    };

    if !BookingRepo::accept(&mut tx, id, acceptance_expires_at, now).await? {
        tx.rollback().await?;
        return Err(AppError::Core(CoreError::InvalidTransition(
            "Booking was settled by a concurrent action".into(),
        )));
    }
    tx.commit().await?;

    state.event_bus.publish(
        BookingEvent::new(BOOKING_ACCEPTED)
            .for_booking(id)
            .notify_user(booking.client_id)
            .with_payload(serde_json::json!({
                "acceptance_expires_at": acceptance_expires_at,
            })),
    );

    let updated = find_booking(&state, id).await?;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/bookings/{id}/decline
///
/// Stylist declines a pending request. Settles as `CANCELLED` with a 97%
/// refund to the client when funds were captured.
pub async fn decline(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = find_booking(&state, id).await?;
    decide_decline(booking.status().map_err(AppError::Core)?).map_err(AppError::Core)?;

    let participants = participants(&state, id).await?;
    let audit = CancelAudit {
        cancelled_by: participants.stylist_user_id,
        reason: "Declined by stylist",
    };

    match Settlement::apply(&state.pool, id, Outcome::StylistDecline, Some(audit), Utc::now())
        .await?
    {
        SettleResult::Applied(done) => {
            publish_settled(&state.event_bus, BOOKING_DECLINED, &done, Outcome::StylistDecline);
        }
        SettleResult::Skipped => {
            return Err(AppError::Core(CoreError::InvalidTransition(
                "Booking was settled by a concurrent action".into(),
            )))
        }
    }

    let updated = find_booking(&state, id).await?;
    Ok(Json(DataResponse { data: updated }))
}

/// Request body for `POST /bookings/{id}/confirm`.
#[derive(Debug, Deserialize)]
pub struct ConfirmBooking {
    /// Payment provider reference captured by the front-end checkout.
    pub payment_intent_id: String,
}

/// POST /api/v1/bookings/{id}/confirm
///
/// Client confirms an accepted booking with a payment reference. Creates
/// the SUCCEEDED payment row (3%/97% split) in the same transaction as the
/// status change. A lapsed confirmation window settles the booking as
/// `CLIENT_NO_CONFIRM` and answers 410.
pub async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ConfirmBooking>,
) -> AppResult<Json<DataResponse<Booking>>> {
    if input.payment_intent_id.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "payment_intent_id must not be empty".into(),
        )));
    }

    let now = Utc::now();
    let mut tx = state.pool.begin().await?;

    let booking = BookingRepo::lock_by_id(&mut tx, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Booking",
            id,
        }))?;

    let decision = decide_confirm(
        booking.status().map_err(AppError::Core)?,
        booking.acceptance_expires_at,
        now,
    )
    .map_err(AppError::Core)?;

    if decision == ConfirmDecision::AcceptanceExpired {
        tx.rollback().await?;
        return Err(settle_lapsed(&state, id, Outcome::ClientNoConfirm).await);
    }

    // 3% platform fee, 97% stylist payout, rounded the same way the
    // distribution engine rounds, so the payment row and any later ledger
    // entries agree to the cent.
    let amount = booking.total_price;
    let platform_fee = (amount * distribution::platform_fee_rate()).round_dp(distribution::CENTS);
    let stylist_payout = amount - platform_fee;

    BookingRepo::confirm(&mut tx, id, &input.payment_intent_id, now).await?;
    PaymentRepo::create_succeeded(
        &mut tx,
        id,
        &input.payment_intent_id,
        amount,
        platform_fee,
        stylist_payout,
        now,
    )
    .await?;

    tx.commit().await?;

    let participants = participants(&state, id).await?;
    state.event_bus.publish(
        BookingEvent::new(BOOKING_CONFIRMED)
            .for_booking(id)
            .notify_user(participants.stylist_user_id)
            .with_payload(serde_json::json!({
                "service_name": participants.service_name,
                "amount": amount,
            })),
    );

    let updated = find_booking(&state, id).await?;
    Ok(Json(DataResponse { data: updated }))
}

/// Request body for `POST /bookings/{id}/cancel`.
#[derive(Debug, Deserialize)]
pub struct CancelBooking {
    /// The user performing the cancellation.
    pub user_id: DbId,
    /// `CLIENT` or `STYLIST`.
    pub role: String,
    pub reason: Option<String>,
    /// Admin override for a late client cancellation; the payment is
    /// retained instead of refunded.
    #[serde(default)]
    pub force: bool,
}

/// POST /api/v1/bookings/{id}/cancel
///
/// Role-aware cancellation with the minimum-notice policy guard. On-time
/// cancellations move a succeeded payment to `PENDING_REFUND`; a forced
/// late client cancellation retains it.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CancelBooking>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let role = match input.role.to_uppercase().as_str() {
        "CLIENT" => CancelRole::Client,
        "STYLIST" => CancelRole::Stylist,
        other => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown cancellation role: {other}"
            ))))
        }
    };

    let now = Utc::now();
    let mut tx = state.pool.begin().await?;

    let booking = BookingRepo::lock_by_id(&mut tx, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Booking",
            id,
        }))?;

    let decision = decide_cancel(
        booking.status().map_err(AppError::Core)?,
        role,
        booking.starts_at() - now,
        input.force,
    )
    .map_err(AppError::Core)?;

    let reason = input
        .reason
        .as_deref()
        .unwrap_or(match (role, decision.late) {
            (CancelRole::Client, true) => "Late cancellation by client (forced)",
            (CancelRole::Client, false) => "Cancelled by client",
            (CancelRole::Stylist, _) => "Cancelled by stylist",
        });

    BookingRepo::cancel(&mut tx, id, input.user_id, reason, now).await?;

    // Refund disposition applies to the payment rail, not the credit
    // ledger; cancellations refund through the payment provider.
    if let Some(payment) = PaymentRepo::find_succeeded(&mut tx, id).await? {
        let status = match decision.refund {
            RefundDisposition::PendingRefund => PaymentStatus::PendingRefund,
            RefundDisposition::Retained => PaymentStatus::Retained,
        };
        PaymentRepo::set_status(&mut tx, payment.id, status, Some(reason), now).await?;
    }

    tx.commit().await?;

    let participants = participants(&state, id).await?;
    let notify = match role {
        CancelRole::Client => participants.stylist_user_id,
        CancelRole::Stylist => participants.client_user_id,
    };
    state.event_bus.publish(
        BookingEvent::new(BOOKING_CANCELLED)
            .for_booking(id)
            .notify_user(notify)
            .with_payload(serde_json::json!({
                "reason": reason,
                "late": decision.late,
                "service_name": participants.service_name,
            })),
    );

    let updated = find_booking(&state, id).await?;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/bookings/{id}/complete
///
/// Mark a confirmed appointment as done; the stylist's 97% payout lands on
/// their credit ledger in the same transaction.
pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Booking>>> {
    match Settlement::apply(&state.pool, id, Outcome::StylistSuccess, None, Utc::now()).await? {
        SettleResult::Applied(done) => {
            publish_settled(&state.event_bus, BOOKING_COMPLETED, &done, Outcome::StylistSuccess);
        }
        SettleResult::Skipped => {
            return Err(AppError::Core(CoreError::InvalidTransition(
                "Only a confirmed booking can be completed".into(),
            )))
        }
    }

    let updated = find_booking(&state, id).await?;
    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/v1/bookings/mine?user_id&role
///
/// List a user's bookings, newest first, from either side of the
/// marketplace.
pub async fn mine(
    State(state): State<AppState>,
    Query(params): Query<MyBookingsQuery>,
) -> AppResult<Json<DataResponse<Vec<Booking>>>> {
    let bookings = match params.role.to_uppercase().as_str() {
        "CLIENT" => BookingRepo::list_for_client(&state.pool, params.user_id).await?,
        "STYLIST" => BookingRepo::list_for_stylist_user(&state.pool, params.user_id).await?,
        other => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown role: {other}"
            ))))
        }
    };
    Ok(Json(DataResponse { data: bookings }))
}

/// GET /api/v1/bookings/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = find_booking(&state, id).await?;
    Ok(Json(DataResponse { data: booking }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_booking(state: &AppState, id: DbId) -> AppResult<Booking> {
    BookingRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Booking",
            id,
        }))
}

async fn participants(
    state: &AppState,
    id: DbId,
) -> AppResult<beautycita_db::models::booking::BookingParticipants> {
    let mut conn = state.pool.acquire().await?;
    BookingRepo::participants(&mut conn, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Booking",
            id,
        }))
}

/// An action arrived after its window lapsed: settle the booking as
/// expired right now instead of waiting for the sweep, then surface the
/// deadline error for the caller.
async fn settle_lapsed(state: &AppState, id: DbId, outcome: Outcome) -> AppError {
    match Settlement::apply(&state.pool, id, outcome, None, Utc::now()).await {
        Ok(SettleResult::Applied(done)) => {
            publish_settled(&state.event_bus, BOOKING_EXPIRED, &done, outcome);
        }
        Ok(SettleResult::Skipped) => {
            // The sweep or a concurrent action got there first.
        }
        Err(e) => {
            tracing::error!(error = %e, booking_id = id, "Inline expiration settlement failed");
        }
    }

    AppError::Core(CoreError::DeadlineExceeded(match outcome {
        Outcome::ClientNoConfirm => "The confirmation window has closed".to_string(),
        _ => "The request window has closed".to_string(),
    }))
}
