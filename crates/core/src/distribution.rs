//! Fund-distribution planner.
//!
//! Pure function of `(booking, total, outcome)` producing the ledger
//! instructions for a terminal booking outcome. It decides *what* to
//! credit, never *when*; applying the plan transactionally is the
//! settlement engine's job.
//!
//! All arithmetic is fixed-point [`Decimal`]. The platform fee is rounded
//! to cents first and every split takes the last share as a remainder, so
//! `platform_fee + sum(entries) == total` holds exactly for every outcome.

use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

/// Currency minor-unit precision (cents).
pub const CENTS: u32 = 2;

/// Platform fee: 3% of the total, retained by the marketplace on every
/// outcome and never entered into any user's ledger.
pub fn platform_fee_rate() -> Decimal {
    Decimal::new(3, 2)
}

/// Client share of the remaining 97% on a client no-show (partial refund).
pub fn client_no_show_share() -> Decimal {
    Decimal::new(60, 2)
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Terminal outcome driving a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Booking completed: 97% to the stylist.
    StylistSuccess,
    /// Stylist declined the request: 97% back to the client.
    StylistDecline,
    /// Stylist never responded: 97% back to the client.
    StylistNoResponse,
    /// Client never confirmed: 97% back to the client.
    ClientNoConfirm,
    /// Client did not show up: 60/40 split of the 97% between client and
    /// stylist.
    ClientNoShow,
    /// Stylist did not show up: 97% back to the client.
    StylistNoShow,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StylistSuccess => "STYLIST_SUCCESS",
            Self::StylistDecline => "STYLIST_DECLINE",
            Self::StylistNoResponse => "STYLIST_NO_RESPONSE",
            Self::ClientNoConfirm => "CLIENT_NO_CONFIRM",
            Self::ClientNoShow => "CLIENT_NO_SHOW",
            Self::StylistNoShow => "STYLIST_NO_SHOW",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "STYLIST_SUCCESS" => Ok(Self::StylistSuccess),
            "STYLIST_DECLINE" => Ok(Self::StylistDecline),
            "STYLIST_NO_RESPONSE" => Ok(Self::StylistNoResponse),
            "CLIENT_NO_CONFIRM" => Ok(Self::ClientNoConfirm),
            "CLIENT_NO_SHOW" => Ok(Self::ClientNoShow),
            "STYLIST_NO_SHOW" => Ok(Self::StylistNoShow),
            other => Err(CoreError::Validation(format!(
                "Unknown distribution outcome: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger vocabulary
// ---------------------------------------------------------------------------

/// Which balance partition a credit lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditType {
    Pending,
    Available,
}

impl CreditType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Available => "AVAILABLE",
        }
    }
}

/// Ledger transaction type, stored as TEXT on `credit_transactions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Stylist payout for a completed booking.
    BookingPayment,
    /// Full 97% refund to the client for a failed booking.
    BookingRefund,
    /// 60% partial refund to the client on a client no-show.
    NoShowPartialRefund,
    /// 40% compensation to the stylist on a client no-show.
    NoShowCompensation,
    /// Full 97% refund to the client on a stylist no-show.
    StylistNoShowRefund,
    /// Debit from available credits on a withdrawal request.
    WithdrawalRequest,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BookingPayment => "BOOKING_PAYMENT",
            Self::BookingRefund => "BOOKING_REFUND",
            Self::NoShowPartialRefund => "NO_SHOW_PARTIAL_REFUND",
            Self::NoShowCompensation => "NO_SHOW_COMPENSATION",
            Self::StylistNoShowRefund => "STYLIST_NO_SHOW_REFUND",
            Self::WithdrawalRequest => "WITHDRAWAL_REQUEST",
        }
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// The two user accounts a booking's funds can flow to.
#[derive(Debug, Clone, Copy)]
pub struct BookingParties {
    pub client_user_id: DbId,
    pub stylist_user_id: DbId,
}

/// One ledger credit to apply: upsert the balance row, increment the
/// partition, append one immutable transaction record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CreditInstruction {
    pub user_id: DbId,
    pub amount: Decimal,
    pub credit_type: CreditType,
    pub transaction_type: TransactionType,
    pub description: String,
}

/// The full consequence of a terminal outcome.
#[derive(Debug, Clone)]
pub struct DistributionPlan {
    /// Retained by the platform; never credited to any ledger.
    pub platform_fee: Decimal,
    pub entries: Vec<CreditInstruction>,
}

impl DistributionPlan {
    /// Sum of all ledger credits in the plan.
    pub fn distributed_total(&self) -> Decimal {
        self.entries.iter().map(|e| e.amount).sum()
    }
}

/// Build the distribution plan for a terminal outcome.
///
/// `total` is the booking's immutable `total_price`. The 3% platform fee
/// is carved off first (rounded to cents); the remaining 97% is assigned
/// per the outcome table. Splits compute the last share by subtraction so
/// the partition reconstructs `total` exactly.
pub fn plan(
    booking_id: DbId,
    parties: &BookingParties,
    total: Decimal,
    outcome: Outcome,
) -> Result<DistributionPlan, CoreError> {
    if total.is_sign_negative() {
        return Err(CoreError::Validation(format!(
            "Booking total must not be negative, got {total}"
        )));
    }

    let platform_fee = (total * platform_fee_rate()).round_dp(CENTS);
    let remaining = total - platform_fee;

    let entries = match outcome {
        Outcome::StylistSuccess => vec![CreditInstruction {
            user_id: parties.stylist_user_id,
            amount: remaining,
            credit_type: CreditType::Available,
            transaction_type: TransactionType::BookingPayment,
            description: format!("Payment for completed booking #{booking_id}"),
        }],

        Outcome::StylistDecline | Outcome::StylistNoResponse | Outcome::ClientNoConfirm => {
            vec![CreditInstruction {
                user_id: parties.client_user_id,
                amount: remaining,
                credit_type: CreditType::Available,
                transaction_type: TransactionType::BookingRefund,
                description: format!("Refund for failed booking #{booking_id}"),
            }]
        }

        Outcome::ClientNoShow => {
            let client_amount = (remaining * client_no_show_share()).round_dp(CENTS);
            let stylist_amount = remaining - client_amount;
            vec![
                CreditInstruction {
                    user_id: parties.client_user_id,
                    amount: client_amount,
                    credit_type: CreditType::Available,
                    transaction_type: TransactionType::NoShowPartialRefund,
                    description: format!("Partial refund for no-show booking #{booking_id} (60%)"),
                },
                CreditInstruction {
                    user_id: parties.stylist_user_id,
                    amount: stylist_amount,
                    credit_type: CreditType::Available,
                    transaction_type: TransactionType::NoShowCompensation,
                    description: format!("No-show compensation for booking #{booking_id} (40%)"),
                },
            ]
        }

        Outcome::StylistNoShow => vec![CreditInstruction {
            user_id: parties.client_user_id,
            amount: remaining,
            credit_type: CreditType::Available,
            transaction_type: TransactionType::StylistNoShowRefund,
            description: format!("Full refund for stylist no-show booking #{booking_id}"),
        }],
    };

    Ok(DistributionPlan {
        platform_fee,
        entries,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
