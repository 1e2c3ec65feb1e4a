//! Database-backed tests for the settlement engine and the expiration
//! sweep: idempotence, funds gating, exact partitioning, and the status
//! guards that keep concurrent settlements mutually exclusive.

mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use beautycita_api::config::SweepConfig;
use beautycita_api::engine::{CancelAudit, ExpirationSweep, SettleResult, Settlement};
use beautycita_core::distribution::Outcome;
use beautycita_core::lifecycle::BookingStatus;
use beautycita_db::repositories::BookingRepo;
use beautycita_events::EventBus;

// ---------------------------------------------------------------------------
// Test: settling the same booking twice applies once
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn settlement_applies_exactly_once(pool: PgPool) {
    let market = common::seed_marketplace(&pool).await;
    let id = common::seed_booking(
        &pool,
        &market,
        "VERIFY_ACCEPTANCE",
        Some("pi_idem_111"),
        Utc::now() - Duration::minutes(20),
        Some(Utc::now() - Duration::minutes(5)),
    )
    .await;

    let first = Settlement::apply(&pool, id, Outcome::ClientNoConfirm, None, Utc::now())
        .await
        .unwrap();
    let done = match first {
        SettleResult::Applied(done) => done,
        SettleResult::Skipped => panic!("first settlement must apply"),
    };
    assert_eq!(done.to, BookingStatus::ClientNoConfirm);
    assert_eq!(done.entries.len(), 1);
    assert_eq!(done.entries[0].amount, Decimal::new(48500, 2));

    // The second attempt observes the terminal status and writes nothing.
    let second = Settlement::apply(&pool, id, Outcome::ClientNoConfirm, None, Utc::now())
        .await
        .unwrap();
    assert!(matches!(second, SettleResult::Skipped));

    assert_eq!(common::booking_status(&pool, id).await, "CLIENT_NO_CONFIRM");
    assert_eq!(common::ledger_rows(&pool, id).await, 1);
    assert_eq!(
        common::available_credits(&pool, market.client_user_id).await,
        Decimal::new(48500, 2)
    );
}

// ---------------------------------------------------------------------------
// Test: no captured funds means a bare transition, no ledger rows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn settlement_without_captured_funds_writes_no_ledger(pool: PgPool) {
    let market = common::seed_marketplace(&pool).await;
    let id = common::seed_booking(
        &pool,
        &market,
        "PENDING",
        None,
        Utc::now() - Duration::minutes(5),
        None,
    )
    .await;

    let result = Settlement::apply(&pool, id, Outcome::StylistNoResponse, None, Utc::now())
        .await
        .unwrap();
    let done = match result {
        SettleResult::Applied(done) => done,
        SettleResult::Skipped => panic!("settlement must apply"),
    };
    assert!(done.entries.is_empty());

    assert_eq!(common::booking_status(&pool, id).await, "STYLIST_NO_RESPONSE");
    assert_eq!(common::ledger_rows(&pool, id).await, 0);
    assert_eq!(
        common::available_credits(&pool, market.client_user_id).await,
        Decimal::ZERO
    );
}

// ---------------------------------------------------------------------------
// Test: client no-show splits the captured funds 60/40, audit recorded
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn client_no_show_partitions_the_total_exactly(pool: PgPool) {
    let market = common::seed_marketplace(&pool).await;
    let id = common::seed_booking(
        &pool,
        &market,
        "CONFIRMED",
        Some("pi_noshow_333"),
        Utc::now() - Duration::hours(1),
        Some(Utc::now() - Duration::minutes(30)),
    )
    .await;
    common::seed_succeeded_payment(&pool, id, "pi_noshow_333").await;

    let audit = CancelAudit {
        cancelled_by: market.stylist_user_id,
        reason: "Client did not show up",
    };
    let result = Settlement::apply(&pool, id, Outcome::ClientNoShow, Some(audit), Utc::now())
        .await
        .unwrap();
    let done = match result {
        SettleResult::Applied(done) => done,
        SettleResult::Skipped => panic!("settlement must apply"),
    };

    // 500.00 = 15.00 fee + 291.00 client + 194.00 stylist, to the cent.
    assert_eq!(
        common::available_credits(&pool, market.client_user_id).await,
        Decimal::new(29100, 2)
    );
    assert_eq!(
        common::available_credits(&pool, market.stylist_user_id).await,
        Decimal::new(19400, 2)
    );
    let distributed: Decimal = done.entries.iter().map(|e| e.amount).sum();
    assert_eq!(distributed + Decimal::new(1500, 2), Decimal::new(50000, 2));

    assert_eq!(common::booking_status(&pool, id).await, "CANCELLED");
    let cancelled_by: Option<i64> =
        sqlx::query_scalar("SELECT cancelled_by FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(cancelled_by, Some(market.stylist_user_id));
}

// ---------------------------------------------------------------------------
// Test: one sweep tick settles both lapsed phases, the next finds nothing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_tick_settles_both_lapsed_phases_once(pool: PgPool) {
    let market = common::seed_marketplace(&pool).await;
    let lapsed_request = common::seed_booking(
        &pool,
        &market,
        "PENDING_STYLIST_APPROVAL",
        Some("pi_sweep_444"),
        Utc::now() - Duration::minutes(10),
        Some(Utc::now() + Duration::minutes(5)),
    )
    .await;
    let lapsed_confirmation = common::seed_booking(
        &pool,
        &market,
        "VERIFY_ACCEPTANCE",
        Some("pi_sweep_555"),
        Utc::now() + Duration::minutes(30),
        Some(Utc::now() - Duration::minutes(2)),
    )
    .await;

    let sweep = ExpirationSweep::new(
        pool.clone(),
        std::sync::Arc::new(EventBus::default()),
        SweepConfig::default(),
    );

    assert_eq!(sweep.tick().await, 2);
    assert_eq!(
        common::booking_status(&pool, lapsed_request).await,
        "STYLIST_NO_RESPONSE"
    );
    assert_eq!(
        common::booking_status(&pool, lapsed_confirmation).await,
        "CLIENT_NO_CONFIRM"
    );
    assert_eq!(common::ledger_rows(&pool, lapsed_request).await, 1);
    assert_eq!(common::ledger_rows(&pool, lapsed_confirmation).await, 1);

    // Both bookings are terminal now; the next tick has nothing to do.
    assert_eq!(sweep.tick().await, 0);
    assert_eq!(
        common::available_credits(&pool, market.client_user_id).await,
        Decimal::new(97000, 2)
    );
}

// ---------------------------------------------------------------------------
// Test: the accept update refuses rows that left the pending phase
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn accept_update_refuses_rows_that_left_the_pending_phase(pool: PgPool) {
    let market = common::seed_marketplace(&pool).await;
    let pending = common::seed_booking(
        &pool,
        &market,
        "PENDING",
        None,
        Utc::now() + Duration::minutes(5),
        None,
    )
    .await;
    let settled = common::seed_booking(
        &pool,
        &market,
        "STYLIST_NO_RESPONSE",
        None,
        Utc::now() - Duration::minutes(5),
        None,
    )
    .await;

    let deadline = Utc::now() + Duration::minutes(10);
    let mut conn = pool.acquire().await.unwrap();

    assert!(BookingRepo::accept(&mut conn, pending, deadline, Utc::now())
        .await
        .unwrap());
    assert_eq!(common::booking_status(&pool, pending).await, "VERIFY_ACCEPTANCE");

    // A terminal row is not a candidate; the guarded update matches nothing.
    assert!(!BookingRepo::accept(&mut conn, settled, deadline, Utc::now())
        .await
        .unwrap());
    assert_eq!(
        common::booking_status(&pool, settled).await,
        "STYLIST_NO_RESPONSE"
    );
}
