//! Transactional settlement: terminal transition + fund distribution.
//!
//! [`Settlement::apply`] is the only code path that moves a booking into a
//! distributing terminal status. The sweep and the synchronous handlers
//! (decline, complete, admin expire/settle) all funnel through it, so the
//! invariant "status change and ledger writes commit together" holds no
//! matter who triggered the settlement.

use rust_decimal::Decimal;

use beautycita_core::distribution::{self, BookingParties, CreditInstruction, Outcome};
use beautycita_core::error::CoreError;
use beautycita_core::lifecycle::BookingStatus;
use beautycita_core::types::{DbId, Timestamp};
use beautycita_db::repositories::{BookingRepo, CreditRepo, PaymentRepo};
use beautycita_db::DbPool;
use beautycita_events::{BookingEvent, EventBus};

use crate::error::{AppError, AppResult};

/// Audit fields recorded when a settlement lands on `CANCELLED`
/// (decline and the no-show outcomes).
#[derive(Debug, Clone, Copy)]
pub struct CancelAudit<'a> {
    pub cancelled_by: DbId,
    pub reason: &'a str,
}

/// What a committed settlement did, for event publication after commit
/// and the admin endpoints' response bodies.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Settled {
    pub booking_id: DbId,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub client_user_id: DbId,
    pub stylist_user_id: DbId,
    pub service_name: String,
    pub total_price: Decimal,
    /// Ledger credits that committed with the transition. Empty when no
    /// funds were ever captured for the booking.
    pub entries: Vec<CreditInstruction>,
}

/// Result of a settlement attempt.
#[derive(Debug)]
pub enum SettleResult {
    /// The transition and its distribution committed.
    Applied(Box<Settled>),
    /// Nothing was written: the booking is no longer in an eligible status
    /// (a concurrent actor settled it first), or the row was held by
    /// another transaction in skip-locked mode.
    Skipped,
}

/// The single settlement entry point.
pub struct Settlement;

impl Settlement {
    /// Settle a booking with the given outcome, blocking on the row lock.
    ///
    /// Returns [`SettleResult::Skipped`] when the status re-check after the
    /// lock shows the booking already left the eligible phase. Returns
    /// `NotFound` when the booking does not exist.
    pub async fn apply(
        pool: &DbPool,
        booking_id: DbId,
        outcome: Outcome,
        audit: Option<CancelAudit<'_>>,
        now: Timestamp,
    ) -> AppResult<SettleResult> {
        Self::apply_inner(pool, booking_id, outcome, audit, now, false).await
    }

    /// Settle a booking, skipping instead of blocking if the row is locked.
    ///
    /// The sweep uses this variant so overlapping ticks and concurrent user
    /// actions never queue behind each other; a locked row means someone
    /// else is already deciding this booking's fate.
    pub async fn apply_skip_locked(
        pool: &DbPool,
        booking_id: DbId,
        outcome: Outcome,
        now: Timestamp,
    ) -> AppResult<SettleResult> {
        Self::apply_inner(pool, booking_id, outcome, None, now, true).await
    }

    async fn apply_inner(
        pool: &DbPool,
        booking_id: DbId,
        outcome: Outcome,
        audit: Option<CancelAudit<'_>>,
        now: Timestamp,
        skip_locked: bool,
    ) -> AppResult<SettleResult> {
        let mut tx = pool.begin().await?;

        // Lock the row: the transition-and-distribute sequence below is a
        // critical section per booking.
        let booking = if skip_locked {
            match BookingRepo::try_lock_by_id(&mut tx, booking_id).await? {
                Some(b) => b,
                // Locked elsewhere or gone; either way, not ours to settle.
                None => return Ok(SettleResult::Skipped),
            }
        } else {
            match BookingRepo::lock_by_id(&mut tx, booking_id).await? {
                Some(b) => b,
                None => {
                    return Err(AppError::Core(CoreError::NotFound {
                        entity: "Booking",
                        id: booking_id,
                    }))
                }
            }
        };

        // Re-check eligibility under the lock. Whoever locked first won;
        // a second settlement attempt observes the terminal status here
        // and becomes a no-op.
        let from = booking.status().map_err(AppError::Core)?;
        if !eligible_from(outcome).contains(&from) {
            tx.rollback().await?;
            return Ok(SettleResult::Skipped);
        }

        let participants = BookingRepo::participants(&mut tx, booking_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Booking",
                id: booking_id,
            }))?;

        // Distribution applies only when funds were actually captured: a
        // payment-first booking carries its intent from creation, a
        // standard-flow booking gains a SUCCEEDED payment row at confirm.
        let payment = PaymentRepo::find_succeeded(&mut tx, booking_id).await?;
        let has_funds = payment.is_some() || booking.payment_intent_id.is_some();

        let entries = if has_funds {
            let parties = BookingParties {
                client_user_id: participants.client_user_id,
                stylist_user_id: participants.stylist_user_id,
            };
            let plan = distribution::plan(booking_id, &parties, booking.total_price, outcome)
                .map_err(AppError::Core)?;

            for instruction in &plan.entries {
                CreditRepo::apply(
                    &mut tx,
                    instruction,
                    Some(booking_id),
                    booking.payment_intent_id.as_deref(),
                )
                .await
                .map_err(|e| {
                    AppError::Core(CoreError::DistributionFailure(format!(
                        "Ledger write failed for booking {booking_id}: {e}"
                    )))
                })?;
            }
            plan.entries
        } else {
            Vec::new()
        };

        // Status transition, with the cancellation audit trail where the
        // outcome lands on CANCELLED.
        let to = target_status(outcome);
        match (to, audit) {
            (BookingStatus::Cancelled, Some(a)) => {
                BookingRepo::cancel(&mut tx, booking_id, a.cancelled_by, a.reason, now).await?;
            }
            _ => {
                BookingRepo::set_status(&mut tx, booking_id, to, now).await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            booking_id,
            outcome = outcome.as_str(),
            from = from.as_str(),
            to = to.as_str(),
            entries = entries.len(),
            "Booking settled"
        );

        Ok(SettleResult::Applied(Box::new(Settled {
            booking_id,
            from,
            to,
            client_user_id: participants.client_user_id,
            stylist_user_id: participants.stylist_user_id,
            service_name: participants.service_name,
            total_price: booking.total_price,
            entries,
        })))
    }
}

/// Statuses from which the given outcome may settle a booking.
pub fn eligible_from(outcome: Outcome) -> &'static [BookingStatus] {
    match outcome {
        Outcome::StylistNoResponse | Outcome::StylistDecline => &[
            BookingStatus::Pending,
            BookingStatus::PendingStylistApproval,
        ],
        Outcome::ClientNoConfirm => &[BookingStatus::VerifyAcceptance],
        Outcome::StylistSuccess | Outcome::ClientNoShow | Outcome::StylistNoShow => {
            &[BookingStatus::Confirmed]
        }
    }
}

/// Terminal status the given outcome settles a booking into.
pub fn target_status(outcome: Outcome) -> BookingStatus {
    match outcome {
        Outcome::StylistNoResponse => BookingStatus::StylistNoResponse,
        Outcome::ClientNoConfirm => BookingStatus::ClientNoConfirm,
        Outcome::StylistSuccess => BookingStatus::Completed,
        Outcome::StylistDecline | Outcome::ClientNoShow | Outcome::StylistNoShow => {
            BookingStatus::Cancelled
        }
    }
}

/// Publish post-commit events for a settled booking: one per credited user,
/// or a single client-facing event when no funds were distributed.
pub fn publish_settled(bus: &EventBus, event_type: &str, settled: &Settled, outcome: Outcome) {
    let base = |user_id: DbId| {
        BookingEvent::new(event_type)
            .for_booking(settled.booking_id)
            .notify_user(user_id)
    };

    if settled.entries.is_empty() {
        bus.publish(base(settled.client_user_id).with_payload(serde_json::json!({
            "outcome": outcome.as_str(),
            "status": settled.to.as_str(),
            "service_name": &settled.service_name,
        })));
        return;
    }

    for entry in &settled.entries {
        bus.publish(base(entry.user_id).with_payload(serde_json::json!({
            "outcome": outcome.as_str(),
            "status": settled.to.as_str(),
            "service_name": &settled.service_name,
            "amount": entry.amount,
            "transaction_type": entry.transaction_type.as_str(),
        })));
    }
}
