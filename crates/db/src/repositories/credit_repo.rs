//! Repository for the credit ledger (`user_credits` + `credit_transactions`).
//!
//! The balance row is incremented in place at the store level (never
//! read-modify-write in application code), so concurrent distributions to
//! the same user cannot lose updates. [`CreditRepo::apply`] performs the
//! upsert, the increment, and the ledger append on one connection; callers
//! wrap it in a transaction together with the booking status change.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use beautycita_core::distribution::{CreditInstruction, CreditType};
use beautycita_core::types::DbId;

use crate::models::credit::{CreditHistoryQuery, CreditTransaction, UserCredits};

/// Default page size for the transaction history.
const DEFAULT_HISTORY_LIMIT: i64 = 20;

/// Maximum page size for the transaction history.
const MAX_HISTORY_LIMIT: i64 = 100;

/// Provides persistence operations for the credit ledger.
pub struct CreditRepo;

impl CreditRepo {
    /// Create the user's zero balance row if it does not exist yet.
    pub async fn ensure_account(conn: &mut PgConnection, user_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_credits (user_id, pending_credits, available_credits) \
             VALUES ($1, 0.00, 0.00) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Apply one credit instruction: upsert the balance row, increment the
    /// right partition in place, and append the immutable ledger record.
    ///
    /// All three steps run on the caller's connection; wrap in a
    /// transaction so a partial application cannot be observed.
    pub async fn apply(
        conn: &mut PgConnection,
        instruction: &CreditInstruction,
        booking_id: Option<DbId>,
        reference_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        Self::ensure_account(conn, instruction.user_id).await?;

        // Column picked by credit type; amounts bind as parameters.
        let update = match instruction.credit_type {
            CreditType::Pending => {
                "UPDATE user_credits \
                 SET pending_credits = pending_credits + $1, updated_at = NOW() \
                 WHERE user_id = $2"
            }
            CreditType::Available => {
                "UPDATE user_credits \
                 SET available_credits = available_credits + $1, updated_at = NOW() \
                 WHERE user_id = $2"
            }
        };
        sqlx::query(update)
            .bind(instruction.amount)
            .bind(instruction.user_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            "INSERT INTO credit_transactions \
                 (user_id, booking_id, transaction_type, amount, credit_type, \
                  description, reference_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(instruction.user_id)
        .bind(booking_id)
        .bind(instruction.transaction_type.as_str())
        .bind(instruction.amount)
        .bind(instruction.credit_type.as_str())
        .bind(&instruction.description)
        .bind(reference_id)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// The user's balance row, created at zero on first read.
    pub async fn balance(pool: &PgPool, user_id: DbId) -> Result<UserCredits, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::ensure_account(&mut conn, user_id).await?;
        sqlx::query_as::<_, UserCredits>(
            "SELECT user_id, pending_credits, available_credits, updated_at \
             FROM user_credits WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
    }

    /// Ledger history for a user, newest first.
    pub async fn history(
        pool: &PgPool,
        params: &CreditHistoryQuery,
    ) -> Result<Vec<CreditTransaction>, sqlx::Error> {
        let limit = params
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .min(MAX_HISTORY_LIMIT);
        let offset = params.offset.unwrap_or(0);

        sqlx::query_as::<_, CreditTransaction>(
            "SELECT id, user_id, booking_id, transaction_type, amount, credit_type, \
                    description, reference_id, created_at \
             FROM credit_transactions \
             WHERE user_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(params.user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Deduct a withdrawal from available credits and append the ledger
    /// record, atomically.
    ///
    /// Returns `false` when the user's available balance is insufficient
    /// (the guarded `UPDATE` matches no row, so nothing is written).
    pub async fn withdraw(
        pool: &PgPool,
        user_id: DbId,
        amount: Decimal,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE user_credits \
             SET available_credits = available_credits - $1, updated_at = NOW() \
             WHERE user_id = $2 AND available_credits >= $1",
        )
        .bind(amount)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO credit_transactions \
                 (user_id, transaction_type, amount, credit_type, description) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user_id)
        .bind(
            beautycita_core::distribution::TransactionType::WithdrawalRequest.as_str(),
        )
        .bind(amount)
        .bind(CreditType::Available.as_str())
        .bind(format!("Withdrawal request for ${amount}"))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
