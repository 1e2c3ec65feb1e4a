//! BeautyCita event bus and notification delivery.
//!
//! Building blocks for the marketplace's fire-and-forget side channel:
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. Booking and ledger events are published
//!   here only *after* the settlement transaction commits, so a delivery
//!   failure can never roll back a financial state change.
//! - [`BookingEvent`]: the canonical domain event envelope.
//! - [`delivery`]: external channels (SMS provider HTTP API, SMTP email).
//!   Failures are logged by the caller, never propagated.

pub mod bus;
pub mod delivery;

pub use bus::{
    BookingEvent, EventBus, BOOKING_ACCEPTED, BOOKING_CANCELLED, BOOKING_COMPLETED,
    BOOKING_CONFIRMED, BOOKING_CREATED, BOOKING_DECLINED, BOOKING_EXPIRED, WITHDRAWAL_REQUESTED,
};
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::sms::{SmsConfig, SmsDelivery};
