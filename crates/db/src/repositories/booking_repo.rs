//! Repository for the `bookings` table.
//!
//! Status strings always come from `BookingStatus::as_str()`; no literal
//! status appears in a query. Sweep candidate queries exclude terminal
//! statuses by construction (they filter on the phase status), so
//! re-scanning settled bookings is impossible rather than merely rejected.

use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgConnection, PgPool};

use beautycita_core::lifecycle::BookingStatus;
use beautycita_core::types::{DbId, Timestamp};

use crate::models::booking::{
    Booking, BookingParticipants, ExpirationStat, NewBooking, ServiceSummary,
};

/// Column list for `bookings` queries.
const COLUMNS: &str = "\
    id, client_id, stylist_id, service_id, booking_date, booking_time, \
    duration_minutes, status, total_price, notes, payment_intent_id, \
    request_expires_at, acceptance_expires_at, confirmed_at, \
    cancelled_at, cancelled_by, cancellation_reason, last_status_change, \
    created_at, updated_at";

/// Provides persistence operations for bookings.
pub struct BookingRepo;

impl BookingRepo {
    /// Insert a new booking with its initial status and phase deadline(s).
    pub async fn create(pool: &PgPool, input: &NewBooking) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookings \
                 (client_id, stylist_id, service_id, booking_date, booking_time, \
                  duration_minutes, status, total_price, notes, payment_intent_id, \
                  request_expires_at, acceptance_expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(input.client_id)
            .bind(input.stylist_id)
            .bind(input.service_id)
            .bind(input.booking_date)
            .bind(input.booking_time)
            .bind(input.duration_minutes)
            .bind(input.status.as_str())
            .bind(input.total_price)
            .bind(&input.notes)
            .bind(&input.payment_intent_id)
            .bind(input.request_expires_at)
            .bind(input.acceptance_expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a booking by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock a booking row for the duration of the caller's transaction.
    ///
    /// `FOR UPDATE` makes the transition-and-distribute sequence a critical
    /// section per booking: a concurrent sweep tick and a user action
    /// serialize here, and whichever runs second sees the updated status.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Like [`BookingRepo::lock_by_id`], but `SKIP LOCKED`: returns `None`
    /// instead of blocking when another transaction already holds the row.
    /// Used by the sweep so overlapping ticks never queue on each other.
    pub async fn try_lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE SKIP LOCKED");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// IDs of bookings whose stylist-response window has closed, soonest
    /// deadline first, bounded by `limit`.
    pub async fn find_expired_stylist_responses(
        pool: &PgPool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT id FROM bookings \
             WHERE status IN ($1, $2) AND request_expires_at <= $3 \
             ORDER BY request_expires_at ASC \
             LIMIT $4",
        )
        .bind(BookingStatus::Pending.as_str())
        .bind(BookingStatus::PendingStylistApproval.as_str())
        .bind(now)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// IDs of bookings whose client-confirmation window has closed, soonest
    /// deadline first, bounded by `limit`.
    pub async fn find_expired_client_confirmations(
        pool: &PgPool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT id FROM bookings \
             WHERE status = $1 AND acceptance_expires_at <= $2 \
             ORDER BY acceptance_expires_at ASC \
             LIMIT $3",
        )
        .bind(BookingStatus::VerifyAcceptance.as_str())
        .bind(now)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Resolve the user-level parties and service name for a booking.
    ///
    /// Bookings reference `stylists.id`; ledgers and notifications need the
    /// stylist's `users.id`, hence the join.
    pub async fn participants(
        conn: &mut PgConnection,
        booking_id: DbId,
    ) -> Result<Option<BookingParticipants>, sqlx::Error> {
        sqlx::query_as::<_, BookingParticipants>(
            "SELECT b.id AS booking_id, \
                    b.client_id AS client_user_id, \
                    st.user_id AS stylist_user_id, \
                    s.name AS service_name \
             FROM bookings b \
             JOIN stylists st ON b.stylist_id = st.id \
             JOIN services s ON b.service_id = s.id \
             WHERE b.id = $1",
        )
        .bind(booking_id)
        .fetch_optional(conn)
        .await
    }

    /// Move a booking to `VERIFY_ACCEPTANCE` with its confirmation deadline.
    ///
    /// The status guard makes the update a no-op on a row that is no
    /// longer awaiting a stylist response; returns `false` in that case so
    /// the caller can surface the lost race instead of overwriting a
    /// settled booking.
    pub async fn accept(
        conn: &mut PgConnection,
        id: DbId,
        acceptance_expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bookings \
             SET status = $2, acceptance_expires_at = $3, \
                 last_status_change = $4, updated_at = $4 \
             WHERE id = $1 AND status IN ($5, $6)",
        )
        .bind(id)
        .bind(BookingStatus::VerifyAcceptance.as_str())
        .bind(acceptance_expires_at)
        .bind(now)
        .bind(BookingStatus::Pending.as_str())
        .bind(BookingStatus::PendingStylistApproval.as_str())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Move a booking to `CONFIRMED`, stamping `confirmed_at`.
    pub async fn confirm(
        conn: &mut PgConnection,
        id: DbId,
        payment_intent_id: &str,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE bookings \
             SET status = $2, payment_intent_id = $3, confirmed_at = $4, \
                 last_status_change = $4, updated_at = $4 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(BookingStatus::Confirmed.as_str())
        .bind(payment_intent_id)
        .bind(now)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Move a booking to `CANCELLED` with the audit trail.
    pub async fn cancel(
        conn: &mut PgConnection,
        id: DbId,
        cancelled_by: DbId,
        reason: &str,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE bookings \
             SET status = $2, cancellation_reason = $3, cancelled_by = $4, \
                 cancelled_at = $5, last_status_change = $5, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(BookingStatus::Cancelled.as_str())
        .bind(reason)
        .bind(cancelled_by)
        .bind(now)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Set a booking's status with no extra audit fields beyond the
    /// timestamps. Used for `EXPIRED` and the sweep's terminal statuses.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: BookingStatus,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE bookings \
             SET status = $2, last_status_change = $3, updated_at = $3 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(now)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// List a client's bookings, newest first.
    pub async fn list_for_client(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM bookings WHERE client_id = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, Booking>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// List bookings for a stylist identified by their *user* id.
    pub async fn list_for_stylist_user(
        pool: &PgPool,
        stylist_user_id: DbId,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            "SELECT b.* FROM bookings b \
             JOIN stylists st ON b.stylist_id = st.id \
             WHERE st.user_id = $1 \
             ORDER BY b.created_at DESC",
        )
        .bind(stylist_user_id)
        .fetch_all(pool)
        .await
    }

    /// Look up an active service offered by the given stylist.
    pub async fn find_active_service(
        pool: &PgPool,
        service_id: DbId,
        stylist_id: DbId,
    ) -> Result<Option<ServiceSummary>, sqlx::Error> {
        sqlx::query_as::<_, ServiceSummary>(
            "SELECT id, name, price, duration_minutes \
             FROM services \
             WHERE id = $1 AND stylist_id = $2 AND is_active = TRUE",
        )
        .bind(service_id)
        .bind(stylist_id)
        .fetch_optional(pool)
        .await
    }

    /// Whether an active user with the given role exists.
    pub async fn user_is_active(
        pool: &PgPool,
        user_id: DbId,
        role: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM users WHERE id = $1 AND role = $2 AND is_active = TRUE")
                .bind(user_id)
                .bind(role)
                .fetch_optional(pool)
                .await?;
        Ok(row.is_some())
    }

    /// Whether an active stylist row exists.
    pub async fn stylist_is_active(pool: &PgPool, stylist_id: DbId) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM stylists WHERE id = $1 AND is_active = TRUE")
                .bind(stylist_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.is_some())
    }

    /// Aggregate expiration outcomes in a date range: count, average and
    /// total booking price grouped by terminal expiration status.
    pub async fn expiration_stats(
        pool: &PgPool,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ExpirationStat>, sqlx::Error> {
        sqlx::query_as::<_, ExpirationStat>(
            "SELECT status, \
                    COUNT(*) AS count, \
                    AVG(total_price) AS avg_amount, \
                    SUM(total_price) AS total_amount \
             FROM bookings \
             WHERE status IN ($1, $2) \
               AND updated_at BETWEEN $3 AND $4 \
             GROUP BY status \
             ORDER BY status",
        )
        .bind(BookingStatus::StylistNoResponse.as_str())
        .bind(BookingStatus::ClientNoConfirm.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }

    /// Check a date/time slot is not already taken by an active booking for
    /// the stylist.
    pub async fn slot_is_free(
        pool: &PgPool,
        stylist_id: DbId,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as(
            "SELECT id FROM bookings \
             WHERE stylist_id = $1 AND booking_date = $2 AND booking_time = $3 \
               AND status IN ($4, $5, $6, $7)",
        )
        .bind(stylist_id)
        .bind(date)
        .bind(time)
        .bind(BookingStatus::Pending.as_str())
        .bind(BookingStatus::PendingStylistApproval.as_str())
        .bind(BookingStatus::VerifyAcceptance.as_str())
        .bind(BookingStatus::Confirmed.as_str())
        .fetch_optional(pool)
        .await?;
        Ok(row.is_none())
    }
}
