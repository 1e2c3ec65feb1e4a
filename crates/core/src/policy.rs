//! Role-aware cancellation policy.
//!
//! Clients must cancel at least 12 hours before the appointment; stylists
//! at least 3 hours. A late client cancellation can only go through with an
//! administrative override, in which case the payment is retained instead
//! of refunded. Stylists have no late-cancel path at all.

use chrono::Duration;

use crate::error::CoreError;
use crate::lifecycle::BookingStatus;

/// Minimum hours before the appointment for a client-initiated cancel.
pub const CLIENT_CANCEL_MIN_HOURS: i64 = 12;

/// Minimum hours before the appointment for a stylist-initiated cancel.
pub const STYLIST_CANCEL_MIN_HOURS: i64 = 3;

/// Which party is cancelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelRole {
    Client,
    Stylist,
}

/// What happens to an existing succeeded payment when the cancel goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundDisposition {
    /// Automatic refund: payment moves to `PENDING_REFUND`.
    PendingRefund,
    /// Late client cancel forced through: payment moves to `RETAINED`,
    /// refundable only on manual request.
    Retained,
}

/// Approved cancellation and its payment consequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelDecision {
    /// True when the cancel happened inside the role's minimum notice
    /// window and only went through because of the override.
    pub late: bool,
    /// Disposition to apply to a succeeded payment, if one exists.
    pub refund: RefundDisposition,
}

/// Evaluate a cancellation request.
///
/// `time_until_booking` is `booking datetime - now`; a negative duration
/// means the appointment has already started. The boundary is inclusive:
/// exactly 12 hours (or 3 for stylists) of notice is enough.
pub fn decide_cancel(
    status: BookingStatus,
    role: CancelRole,
    time_until_booking: Duration,
    admin_override: bool,
) -> Result<CancelDecision, CoreError> {
    if status.is_terminal() {
        return Err(CoreError::InvalidTransition(format!(
            "Cannot cancel booking that is {}",
            status.as_str().to_lowercase()
        )));
    }

    match role {
        CancelRole::Client => {
            let on_time = time_until_booking >= Duration::hours(CLIENT_CANCEL_MIN_HOURS);
            if on_time {
                Ok(CancelDecision {
                    late: false,
                    refund: RefundDisposition::PendingRefund,
                })
            } else if admin_override {
                Ok(CancelDecision {
                    late: true,
                    refund: RefundDisposition::Retained,
                })
            } else {
                Err(CoreError::PolicyViolation(format!(
                    "Clients must cancel at least {CLIENT_CANCEL_MIN_HOURS} hours before the appointment"
                )))
            }
        }
        CancelRole::Stylist => {
            // No late-cancel path for stylists, override or not.
            if time_until_booking >= Duration::hours(STYLIST_CANCEL_MIN_HOURS) {
                Ok(CancelDecision {
                    late: false,
                    refund: RefundDisposition::PendingRefund,
                })
            } else {
                Err(CoreError::PolicyViolation(format!(
                    "Stylists must cancel at least {STYLIST_CANCEL_MIN_HOURS} hours before the appointment"
                )))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn client_cancel_with_plenty_of_notice() {
        let decision = decide_cancel(
            BookingStatus::Confirmed,
            CancelRole::Client,
            Duration::hours(20),
            false,
        )
        .unwrap();
        assert!(!decision.late);
        assert_eq!(decision.refund, RefundDisposition::PendingRefund);
    }

    #[test]
    fn client_cancel_at_exactly_twelve_hours_is_allowed() {
        let decision = decide_cancel(
            BookingStatus::Confirmed,
            CancelRole::Client,
            Duration::hours(12),
            false,
        )
        .unwrap();
        assert!(!decision.late);
    }

    #[test]
    fn client_cancel_under_twelve_hours_rejected() {
        assert_matches!(
            decide_cancel(
                BookingStatus::Confirmed,
                CancelRole::Client,
                Duration::hours(6),
                false,
            ),
            Err(CoreError::PolicyViolation(_))
        );
    }

    #[test]
    fn late_client_cancel_stays_rejected_as_time_runs_out() {
        // Waiting does not make a late cancel legal.
        for hours in [6, 1] {
            assert_matches!(
                decide_cancel(
                    BookingStatus::Confirmed,
                    CancelRole::Client,
                    Duration::hours(hours),
                    false,
                ),
                Err(CoreError::PolicyViolation(_))
            );
        }
    }

    #[test]
    fn forced_late_client_cancel_retains_payment() {
        let decision = decide_cancel(
            BookingStatus::Confirmed,
            CancelRole::Client,
            Duration::hours(6),
            true,
        )
        .unwrap();
        assert!(decision.late);
        assert_eq!(decision.refund, RefundDisposition::Retained);
    }

    #[test]
    fn stylist_cancel_at_exactly_three_hours_is_allowed() {
        let decision = decide_cancel(
            BookingStatus::Confirmed,
            CancelRole::Stylist,
            Duration::hours(3),
            false,
        )
        .unwrap();
        assert_eq!(decision.refund, RefundDisposition::PendingRefund);
    }

    #[test]
    fn stylist_cannot_force_a_late_cancel() {
        assert_matches!(
            decide_cancel(
                BookingStatus::Confirmed,
                CancelRole::Stylist,
                Duration::hours(2),
                true,
            ),
            Err(CoreError::PolicyViolation(_))
        );
    }

    #[test]
    fn cancel_from_pending_is_allowed() {
        assert!(decide_cancel(
            BookingStatus::Pending,
            CancelRole::Client,
            Duration::hours(48),
            false,
        )
        .is_ok());
    }

    #[test]
    fn cancel_from_terminal_rejected() {
        for status in [
            BookingStatus::Cancelled,
            BookingStatus::Completed,
            BookingStatus::Expired,
        ] {
            assert_matches!(
                decide_cancel(status, CancelRole::Client, Duration::hours(48), true),
                Err(CoreError::InvalidTransition(_))
            );
        }
    }

    #[test]
    fn appointment_in_the_past_rejected_for_both_roles() {
        for role in [CancelRole::Client, CancelRole::Stylist] {
            assert_matches!(
                decide_cancel(BookingStatus::Confirmed, role, Duration::hours(-1), false),
                Err(CoreError::PolicyViolation(_))
            );
        }
    }
}
