//! Database-backed integration tests for the booking lifecycle endpoints.
//!
//! These run against a real Postgres (provisioned by `#[sqlx::test]`) and
//! cover the paths the in-process tests cannot: the transactional handler
//! flows, the inline settlement of late actions, and the row-lock
//! discipline that keeps a settled booking settled.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

use beautycita_api::engine::{SettleResult, Settlement};
use beautycita_core::distribution::Outcome;

// ---------------------------------------------------------------------------
// Test: the full happy path pays the stylist exactly once
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn booking_lifecycle_pays_the_stylist_exactly_once(pool: PgPool) {
    let market = common::seed_marketplace(&pool).await;
    let app = common::build_test_app(pool.clone());

    // Create (standard flow, no payment yet).
    let response = common::post_json(
        app.clone(),
        "/api/v1/bookings",
        json!({
            "client_id": market.client_user_id,
            "stylist_id": market.stylist_id,
            "service_id": market.service_id,
            "booking_date": "2027-03-15",
            "booking_time": "10:00:00",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["status"], "PENDING");
    let id = body["data"]["id"].as_i64().unwrap();

    // Accept.
    let response =
        common::post_json(app.clone(), &format!("/api/v1/bookings/{id}/accept"), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::booking_status(&pool, id).await, "VERIFY_ACCEPTANCE");

    // Confirm with a payment reference; the payment row splits 3%/97%.
    let response = common::post_json(
        app.clone(),
        &format!("/api/v1/bookings/{id}/confirm"),
        json!({ "payment_intent_id": "pi_test_123" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::booking_status(&pool, id).await, "CONFIRMED");

    let fee: Decimal =
        sqlx::query_scalar("SELECT platform_fee FROM payments WHERE booking_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(fee, Decimal::new(1500, 2));

    // Complete: 485.00 lands on the stylist's ledger.
    let response =
        common::post_json(app.clone(), &format!("/api/v1/bookings/{id}/complete"), json!({}))
            .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::booking_status(&pool, id).await, "COMPLETED");
    assert_eq!(common::ledger_rows(&pool, id).await, 1);
    assert_eq!(
        common::available_credits(&pool, market.stylist_user_id).await,
        Decimal::new(48500, 2)
    );

    // Completing again is a conflict and credits nothing further.
    let response =
        common::post_json(app, &format!("/api/v1/bookings/{id}/complete"), json!({})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(common::ledger_rows(&pool, id).await, 1);
    assert_eq!(
        common::available_credits(&pool, market.stylist_user_id).await,
        Decimal::new(48500, 2)
    );
}

// ---------------------------------------------------------------------------
// Test: accept cannot overwrite a booking the sweep already settled
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn accept_cannot_resurrect_a_settled_booking(pool: PgPool) {
    let market = common::seed_marketplace(&pool).await;
    let past = Utc::now() - Duration::minutes(5);
    let id = common::seed_booking(
        &pool,
        &market,
        "PENDING_STYLIST_APPROVAL",
        Some("pi_first_111"),
        past,
        Some(Utc::now() + Duration::minutes(10)),
    )
    .await;

    // The sweep settles the lapsed request: terminal status plus the
    // 485.00 refund on the client's ledger.
    let result = Settlement::apply_skip_locked(&pool, id, Outcome::StylistNoResponse, Utc::now())
        .await
        .unwrap();
    assert!(matches!(result, SettleResult::Applied(_)));
    assert_eq!(common::booking_status(&pool, id).await, "STYLIST_NO_RESPONSE");

    // An accept arriving afterwards must lose: the locked re-check sees
    // the terminal status and nothing is overwritten.
    let app = common::build_test_app(pool.clone());
    let response =
        common::post_json(app, &format!("/api/v1/bookings/{id}/accept"), json!({})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    assert_eq!(common::booking_status(&pool, id).await, "STYLIST_NO_RESPONSE");
    assert_eq!(common::ledger_rows(&pool, id).await, 1);
    assert_eq!(
        common::available_credits(&pool, market.client_user_id).await,
        Decimal::new(48500, 2)
    );
}

// ---------------------------------------------------------------------------
// Test: a late accept settles the request inline, once
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn late_accept_settles_the_request_and_refunds_once(pool: PgPool) {
    let market = common::seed_marketplace(&pool).await;
    let past = Utc::now() - Duration::minutes(5);
    let id = common::seed_booking(
        &pool,
        &market,
        "PENDING_STYLIST_APPROVAL",
        Some("pi_late_222"),
        past,
        Some(Utc::now() + Duration::minutes(10)),
    )
    .await;

    let app = common::build_test_app(pool.clone());

    // The lapsed window answers 410 and settles the booking on the spot.
    let response =
        common::post_json(app.clone(), &format!("/api/v1/bookings/{id}/accept"), json!({})).await;
    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(common::booking_status(&pool, id).await, "STYLIST_NO_RESPONSE");
    assert_eq!(common::ledger_rows(&pool, id).await, 1);
    assert_eq!(
        common::available_credits(&pool, market.client_user_id).await,
        Decimal::new(48500, 2)
    );

    // Retrying is a plain conflict now; the refund is not repeated.
    let response =
        common::post_json(app, &format!("/api/v1/bookings/{id}/accept"), json!({})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(common::ledger_rows(&pool, id).await, 1);
}
