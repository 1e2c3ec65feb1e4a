//! Booking entity models and DTOs.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use beautycita_core::error::CoreError;
use beautycita_core::lifecycle::BookingStatus;
use beautycita_core::types::{DbId, Timestamp};

/// A row from the `bookings` table.
///
/// `status` is stored as TEXT; use [`Booking::status`] to get the closed
/// enum (unknown strings surface as a validation error rather than
/// panicking in a `From` impl).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: DbId,
    pub client_id: DbId,
    pub stylist_id: DbId,
    pub service_id: DbId,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: String,
    pub total_price: Decimal,
    pub notes: Option<String>,
    pub payment_intent_id: Option<String>,
    pub request_expires_at: Option<Timestamp>,
    pub acceptance_expires_at: Option<Timestamp>,
    pub confirmed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub cancelled_by: Option<DbId>,
    pub cancellation_reason: Option<String>,
    pub last_status_change: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// Parse the stored status string into the lifecycle enum.
    pub fn status(&self) -> Result<BookingStatus, CoreError> {
        BookingStatus::parse(&self.status)
    }

    /// Appointment start as a UTC instant, for the cancellation notice guard.
    pub fn starts_at(&self) -> Timestamp {
        self.booking_date.and_time(self.booking_time).and_utc()
    }
}

/// Insert payload assembled by the handler once the phase deadlines and
/// initial status are decided.
#[derive(Debug)]
pub struct NewBooking {
    pub client_id: DbId,
    pub stylist_id: DbId,
    pub service_id: DbId,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: BookingStatus,
    pub total_price: Decimal,
    pub notes: Option<String>,
    pub payment_intent_id: Option<String>,
    pub request_expires_at: Timestamp,
    pub acceptance_expires_at: Option<Timestamp>,
}

/// DTO for `POST /api/v1/bookings`.
///
/// When `payment_intent_id` is present the booking is created in the
/// payment-first flow (`PENDING_STYLIST_APPROVAL`, confirmation deadline
/// fixed at creation).
#[derive(Debug, Deserialize)]
pub struct CreateBooking {
    pub client_id: DbId,
    pub stylist_id: DbId,
    pub service_id: DbId,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub notes: Option<String>,
    pub payment_intent_id: Option<String>,
}

/// Parties and service context resolved for notifications and
/// distributions: the client's user id, the stylist's *user* id (bookings
/// reference `stylists.id`, ledgers reference `users.id`), and the service
/// name.
#[derive(Debug, Clone, FromRow)]
pub struct BookingParticipants {
    pub booking_id: DbId,
    pub client_user_id: DbId,
    pub stylist_user_id: DbId,
    pub service_name: String,
}

/// One row of the expiration statistics aggregate.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExpirationStat {
    pub status: String,
    pub count: i64,
    pub avg_amount: Option<Decimal>,
    pub total_amount: Option<Decimal>,
}

/// Query parameters for `GET /api/v1/bookings/mine`.
#[derive(Debug, Deserialize)]
pub struct MyBookingsQuery {
    pub user_id: DbId,
    /// `CLIENT` or `STYLIST`.
    pub role: String,
}

/// Active-service row needed to price and schedule a new booking.
#[derive(Debug, Clone, FromRow)]
pub struct ServiceSummary {
    pub id: DbId,
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: i32,
}
