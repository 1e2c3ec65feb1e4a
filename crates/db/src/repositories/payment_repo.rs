//! Repository for the `payments` table.

use sqlx::PgConnection;

use beautycita_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;

use crate::models::payment::{Payment, PaymentStatus};

/// Column list for `payments` queries.
const COLUMNS: &str = "\
    id, booking_id, stripe_payment_intent_id, amount, platform_fee, \
    stylist_payout, status, refund_reason, processed_at, created_at, updated_at";

/// Provides persistence operations for payment records.
pub struct PaymentRepo;

impl PaymentRepo {
    /// Record a succeeded payment when the client confirms a booking.
    ///
    /// Runs on the caller's connection so the payment row and the booking's
    /// status change commit (or roll back) together.
    pub async fn create_succeeded(
        conn: &mut PgConnection,
        booking_id: DbId,
        payment_intent_id: &str,
        amount: Decimal,
        platform_fee: Decimal,
        stylist_payout: Decimal,
        now: Timestamp,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments \
                 (booking_id, stripe_payment_intent_id, amount, platform_fee, \
                  stylist_payout, status, processed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(booking_id)
            .bind(payment_intent_id)
            .bind(amount)
            .bind(platform_fee)
            .bind(stylist_payout)
            .bind(PaymentStatus::Succeeded.as_str())
            .bind(now)
            .fetch_one(conn)
            .await
    }

    /// The succeeded payment for a booking, if one exists.
    pub async fn find_succeeded(
        conn: &mut PgConnection,
        booking_id: DbId,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE booking_id = $1 AND status = $2"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(booking_id)
            .bind(PaymentStatus::Succeeded.as_str())
            .fetch_optional(conn)
            .await
    }

    /// Move a payment to a refund disposition (`PENDING_REFUND` or
    /// `RETAINED`), keeping the reason for the audit trail.
    pub async fn set_status(
        conn: &mut PgConnection,
        payment_id: DbId,
        status: PaymentStatus,
        refund_reason: Option<&str>,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE payments \
             SET status = $2, refund_reason = COALESCE($3, refund_reason), updated_at = $4 \
             WHERE id = $1",
        )
        .bind(payment_id)
        .bind(status.as_str())
        .bind(refund_reason)
        .bind(now)
        .execute(conn)
        .await?;
        Ok(())
    }
}
