//! Payment entity model and status vocabulary.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use beautycita_core::types::{DbId, Timestamp};

/// Payment record status, stored as TEXT on `payments.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Payment captured when the client confirmed.
    Succeeded,
    /// Cancellation made the payment eligible for automatic refund.
    PendingRefund,
    /// Late forced cancellation: retained, refundable only on request.
    Retained,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "SUCCEEDED",
            Self::PendingRefund => "PENDING_REFUND",
            Self::Retained => "RETAINED",
            Self::Failed => "FAILED",
        }
    }
}

/// A row from the `payments` table. Created when a client's payment is
/// confirmed; mutated by cancellation/refund flows; never deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub booking_id: DbId,
    pub stripe_payment_intent_id: Option<String>,
    pub amount: Decimal,
    pub platform_fee: Decimal,
    pub stylist_payout: Decimal,
    pub status: String,
    pub refund_reason: Option<String>,
    pub processed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
