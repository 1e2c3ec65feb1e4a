//! Handlers for the `/credits` resource: balances, history, withdrawals.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use beautycita_core::error::CoreError;
use beautycita_core::types::DbId;
use beautycita_db::models::credit::{
    CreditBalance, CreditHistoryQuery, CreditTransaction, RequestWithdrawal,
};
use beautycita_db::repositories::CreditRepo;
use beautycita_events::{BookingEvent, WITHDRAWAL_REQUESTED};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /credits/balance`.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub user_id: DbId,
}

/// GET /api/v1/credits/balance?user_id
///
/// The user's pending/available/total balances. Creates the zero balance
/// row on first read, so a brand-new user sees zeros rather than a 404.
pub async fn balance(
    State(state): State<AppState>,
    Query(params): Query<BalanceQuery>,
) -> AppResult<Json<DataResponse<CreditBalance>>> {
    let row = CreditRepo::balance(&state.pool, params.user_id).await?;
    Ok(Json(DataResponse { data: row.into() }))
}

/// GET /api/v1/credits/history?user_id&limit&offset
///
/// The user's ledger history, newest first.
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<CreditHistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<CreditTransaction>>>> {
    let rows = CreditRepo::history(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// POST /api/v1/credits/withdrawals
///
/// Deduct a withdrawal from available credits. The deduction and its
/// ledger record commit together or not at all; an insufficient balance
/// writes nothing and answers 409.
pub async fn request_withdrawal(
    State(state): State<AppState>,
    Json(input): Json<RequestWithdrawal>,
) -> AppResult<(StatusCode, Json<DataResponse<CreditBalance>>)> {
    if input.amount <= Decimal::ZERO {
        return Err(AppError::Core(CoreError::Validation(
            "Withdrawal amount must be positive".into(),
        )));
    }

    let withdrawn = CreditRepo::withdraw(&state.pool, input.user_id, input.amount).await?;
    if !withdrawn {
        return Err(AppError::Core(CoreError::Conflict(
            "Insufficient available credits".into(),
        )));
    }

    state.event_bus.publish(
        BookingEvent::new(WITHDRAWAL_REQUESTED)
            .notify_user(input.user_id)
            .with_payload(serde_json::json!({
                "amount": input.amount,
            })),
    );

    let row = CreditRepo::balance(&state.pool, input.user_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: row.into() })))
}
