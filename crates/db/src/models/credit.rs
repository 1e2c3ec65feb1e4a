//! Credit ledger models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use beautycita_core::types::{DbId, Timestamp};

/// A user's balance row, partitioned into pending and available credits.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserCredits {
    pub user_id: DbId,
    pub pending_credits: Decimal,
    pub available_credits: Decimal,
    pub updated_at: Timestamp,
}

/// Balance view returned by `GET /api/v1/credits/balance`.
#[derive(Debug, Clone, Serialize)]
pub struct CreditBalance {
    pub pending: Decimal,
    pub available: Decimal,
    pub total: Decimal,
}

impl From<UserCredits> for CreditBalance {
    fn from(row: UserCredits) -> Self {
        Self {
            pending: row.pending_credits,
            available: row.available_credits,
            total: row.pending_credits + row.available_credits,
        }
    }
}

/// An immutable row from the append-only `credit_transactions` ledger.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CreditTransaction {
    pub id: DbId,
    pub user_id: DbId,
    pub booking_id: Option<DbId>,
    pub transaction_type: String,
    pub amount: Decimal,
    pub credit_type: String,
    pub description: Option<String>,
    pub reference_id: Option<String>,
    pub created_at: Timestamp,
}

/// Query parameters for `GET /api/v1/credits/history`.
#[derive(Debug, Deserialize)]
pub struct CreditHistoryQuery {
    pub user_id: DbId,
    /// Maximum number of results. Defaults to 20, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// DTO for `POST /api/v1/credits/withdrawals`.
#[derive(Debug, Deserialize)]
pub struct RequestWithdrawal {
    pub user_id: DbId,
    pub amount: Decimal,
}
