//! Booking lifecycle state machine and phase-deadline guards.
//!
//! The status enum, transition table, and deadline decisions live here so
//! that the synchronous HTTP handlers and the background expiration sweep
//! consult exactly the same logic and cannot drift.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Phase windows
// ---------------------------------------------------------------------------

/// Minutes a stylist has to respond to a new booking request.
pub const DEFAULT_REQUEST_WINDOW_MINS: i64 = 5;

/// Minutes a client has to confirm after the stylist accepts
/// (standard flow: window starts at acceptance).
pub const DEFAULT_ACCEPTANCE_WINDOW_MINS: i64 = 10;

/// Total minutes from booking creation to the confirmation deadline in the
/// payment-first flow, where the client has already paid up front.
///
/// The two flows deliberately carry different confirmation deadlines
/// (10 minutes from acceptance vs 15 minutes from creation); which one is
/// authoritative is a pending product decision, so both are configurable
/// rather than merged.
pub const DEFAULT_PAYMENT_FIRST_TOTAL_WINDOW_MINS: i64 = 15;

/// Phase deadline configuration for the booking lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct BookingWindows {
    /// Stylist response window, measured from booking creation.
    pub request: Duration,
    /// Client confirmation window, measured from stylist acceptance.
    pub acceptance: Duration,
    /// Confirmation deadline in the payment-first flow, measured from
    /// booking creation.
    pub payment_first_total: Duration,
}

impl Default for BookingWindows {
    fn default() -> Self {
        Self {
            request: Duration::minutes(DEFAULT_REQUEST_WINDOW_MINS),
            acceptance: Duration::minutes(DEFAULT_ACCEPTANCE_WINDOW_MINS),
            payment_first_total: Duration::minutes(DEFAULT_PAYMENT_FIRST_TOTAL_WINDOW_MINS),
        }
    }
}

// ---------------------------------------------------------------------------
// Status enum
// ---------------------------------------------------------------------------

/// Booking lifecycle status, stored as TEXT in the `bookings.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Awaiting stylist response (standard flow).
    Pending,
    /// Awaiting stylist response, client already paid (payment-first flow).
    PendingStylistApproval,
    /// Stylist accepted; awaiting client confirmation.
    VerifyAcceptance,
    /// Client confirmed and payment was recorded.
    Confirmed,
    /// Service rendered. Terminal.
    Completed,
    /// Cancelled by a party or declined by the stylist. Terminal.
    Cancelled,
    /// Generic expiration. Terminal. Kept for rows written before
    /// expirations became cause-specific; no current code path produces
    /// it. Late accepts settle as [`Self::StylistNoResponse`] and late
    /// confirms as [`Self::ClientNoConfirm`].
    Expired,
    /// Stylist did not respond within the request window. Terminal.
    StylistNoResponse,
    /// Client did not confirm within the acceptance window. Terminal.
    ClientNoConfirm,
}

impl BookingStatus {
    /// Database/API string for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::PendingStylistApproval => "PENDING_STYLIST_APPROVAL",
            Self::VerifyAcceptance => "VERIFY_ACCEPTANCE",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
            Self::StylistNoResponse => "STYLIST_NO_RESPONSE",
            Self::ClientNoConfirm => "CLIENT_NO_CONFIRM",
        }
    }

    /// Parse a database status string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PENDING_STYLIST_APPROVAL" => Ok(Self::PendingStylistApproval),
            "VERIFY_ACCEPTANCE" => Ok(Self::VerifyAcceptance),
            "CONFIRMED" => Ok(Self::Confirmed),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "EXPIRED" => Ok(Self::Expired),
            "STYLIST_NO_RESPONSE" => Ok(Self::StylistNoResponse),
            "CLIENT_NO_CONFIRM" => Ok(Self::ClientNoConfirm),
            other => Err(CoreError::Validation(format!(
                "Unknown booking status: {other}"
            ))),
        }
    }

    /// Whether this status permits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed
                | Self::Cancelled
                | Self::Expired
                | Self::StylistNoResponse
                | Self::ClientNoConfirm
        )
    }

    /// Whether this status is the "awaiting stylist response" phase.
    ///
    /// `Pending` and `PendingStylistApproval` are the same conceptual phase;
    /// they differ only in whether the client paid up front.
    pub fn awaiting_stylist_response(self) -> bool {
        matches!(self, Self::Pending | Self::PendingStylistApproval)
    }

    /// The set of statuses reachable from this one.
    ///
    /// Terminal statuses return an empty slice.
    pub fn valid_transitions(self) -> &'static [BookingStatus] {
        match self {
            Self::Pending | Self::PendingStylistApproval => &[
                Self::VerifyAcceptance,
                Self::Cancelled,
                Self::Expired,
                Self::StylistNoResponse,
            ],
            Self::VerifyAcceptance => &[
                Self::Confirmed,
                Self::Cancelled,
                Self::Expired,
                Self::ClientNoConfirm,
            ],
            Self::Confirmed => &[Self::Completed, Self::Cancelled],
            Self::Completed
            | Self::Cancelled
            | Self::Expired
            | Self::StylistNoResponse
            | Self::ClientNoConfirm => &[],
        }
    }

    /// Check whether a transition from `self` to `to` is valid.
    pub fn can_transition(self, to: BookingStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Validate a transition, returning a descriptive error for invalid ones.
    pub fn validate_transition(self, to: BookingStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition(format!(
                "{} -> {}",
                self.as_str(),
                to.as_str()
            )))
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Expiration
// ---------------------------------------------------------------------------

/// Which phase deadline a booking blew through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpirationType {
    /// Stylist did not respond within the request window.
    StylistNoResponse,
    /// Client did not confirm within the acceptance window.
    ClientNoConfirm,
}

impl ExpirationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StylistNoResponse => "STYLIST_NO_RESPONSE",
            Self::ClientNoConfirm => "CLIENT_NO_CONFIRM",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "STYLIST_NO_RESPONSE" => Ok(Self::StylistNoResponse),
            "CLIENT_NO_CONFIRM" => Ok(Self::ClientNoConfirm),
            other => Err(CoreError::Validation(format!(
                "Unknown expiration type: {other}"
            ))),
        }
    }

    /// The terminal status this expiration moves a booking into.
    pub fn target_status(self) -> BookingStatus {
        match self {
            Self::StylistNoResponse => BookingStatus::StylistNoResponse,
            Self::ClientNoConfirm => BookingStatus::ClientNoConfirm,
        }
    }
}

/// Which expiration applies to a booking in the given status, if any.
///
/// Used by the manual expiration entry point to validate the requested
/// expiration type against the booking's current phase. The sweep filters
/// by status in its queries, so already-terminal bookings never reach here.
pub fn expiration_for_status(status: BookingStatus) -> Option<ExpirationType> {
    if status.awaiting_stylist_response() {
        Some(ExpirationType::StylistNoResponse)
    } else if status == BookingStatus::VerifyAcceptance {
        Some(ExpirationType::ClientNoConfirm)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Action guards
// ---------------------------------------------------------------------------

/// Result of evaluating a stylist-accept action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptDecision {
    /// Guard passed: transition to `VerifyAcceptance` with this
    /// confirmation deadline.
    Accepted { acceptance_expires_at: Timestamp },
    /// The request window has already closed. The booking must be settled
    /// as `StylistNoResponse` (the same settlement the sweep would apply)
    /// and the action rejected with `DeadlineExceeded`.
    RequestExpired,
}

/// Evaluate a stylist accepting a booking request.
///
/// The deadline guard is strict: an accept at exactly `request_expires_at`
/// is treated as expired. In the payment-first flow the confirmation
/// deadline was fixed at creation and is kept; otherwise it is
/// `now + acceptance window`.
pub fn decide_accept(
    status: BookingStatus,
    request_expires_at: Option<Timestamp>,
    acceptance_expires_at: Option<Timestamp>,
    now: Timestamp,
    windows: &BookingWindows,
) -> Result<AcceptDecision, CoreError> {
    if !status.awaiting_stylist_response() {
        return Err(CoreError::InvalidTransition(format!(
            "Booking is {}, cannot accept",
            status.as_str().to_lowercase()
        )));
    }

    if let Some(deadline) = request_expires_at {
        if now >= deadline {
            return Ok(AcceptDecision::RequestExpired);
        }
    }

    let confirmation_deadline = acceptance_expires_at.unwrap_or(now + windows.acceptance);
    Ok(AcceptDecision::Accepted {
        acceptance_expires_at: confirmation_deadline,
    })
}

/// Result of evaluating a client-confirm action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    /// Guard passed: transition to `Confirmed`.
    Confirmed,
    /// The confirmation window has already closed. The booking must be
    /// settled as `ClientNoConfirm` and the action rejected with
    /// `DeadlineExceeded`.
    AcceptanceExpired,
}

/// Evaluate a client confirming an accepted booking.
///
/// Same strict deadline semantics as [`decide_accept`].
pub fn decide_confirm(
    status: BookingStatus,
    acceptance_expires_at: Option<Timestamp>,
    now: Timestamp,
) -> Result<ConfirmDecision, CoreError> {
    if status != BookingStatus::VerifyAcceptance {
        return Err(CoreError::InvalidTransition(format!(
            "Booking is {}, cannot confirm",
            status.as_str().to_lowercase()
        )));
    }

    if let Some(deadline) = acceptance_expires_at {
        if now >= deadline {
            return Ok(ConfirmDecision::AcceptanceExpired);
        }
    }

    Ok(ConfirmDecision::Confirmed)
}

/// Evaluate a stylist declining a booking request.
///
/// Decline is only meaningful while the booking awaits the stylist's
/// response; afterwards the stylist must use cancellation, which carries
/// its own policy guard.
pub fn decide_decline(status: BookingStatus) -> Result<(), CoreError> {
    if status.awaiting_stylist_response() {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition(format!(
            "Booking is {}, cannot decline",
            status.as_str().to_lowercase()
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
