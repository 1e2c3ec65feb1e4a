//! Tests for `AppError` → HTTP response mapping.
//!
//! These tests verify that each `AppError` variant produces the correct HTTP
//! status code, error code, and message. They do NOT need an HTTP server --
//! they call `IntoResponse` directly on `AppError` values.

use axum::response::IntoResponse;
use http_body_util::BodyExt;

use beautycita_api::error::AppError;
use beautycita_core::error::CoreError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (axum::http::StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFound maps to 404 with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Booking",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Booking with id 42 not found");
}

// ---------------------------------------------------------------------------
// Test: CoreError::InvalidTransition maps to 409 with INVALID_TRANSITION code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_transition_error_returns_409() {
    let err = AppError::Core(CoreError::InvalidTransition(
        "Cannot move booking from COMPLETED to CONFIRMED".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::CONFLICT);
    assert_eq!(json["code"], "INVALID_TRANSITION");
    assert_eq!(json["error"], "Cannot move booking from COMPLETED to CONFIRMED");
}

// ---------------------------------------------------------------------------
// Test: CoreError::DeadlineExceeded maps to 410 with DEADLINE_EXCEEDED code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deadline_exceeded_error_returns_410() {
    let err = AppError::Core(CoreError::DeadlineExceeded(
        "The stylist response window has closed".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::GONE);
    assert_eq!(json["code"], "DEADLINE_EXCEEDED");
    assert_eq!(json["error"], "The stylist response window has closed");
}

// ---------------------------------------------------------------------------
// Test: CoreError::PolicyViolation maps to 403 with POLICY_VIOLATION code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn policy_violation_error_returns_403() {
    let err = AppError::Core(CoreError::PolicyViolation(
        "Clients must cancel at least 12 hours before the appointment".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "POLICY_VIOLATION");
    assert_eq!(
        json["error"],
        "Clients must cancel at least 12 hours before the appointment"
    );
}

// ---------------------------------------------------------------------------
// Test: CoreError::Validation maps to 400 with VALIDATION_ERROR code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation(
        "Withdrawal amount must be positive".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Withdrawal amount must be positive");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Conflict maps to 409 with CONFLICT code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("Insufficient available credits".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "Insufficient available credits");
}

// ---------------------------------------------------------------------------
// Test: CoreError::DistributionFailure maps to 500 and sanitizes the message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn distribution_failure_returns_500_and_sanitizes_message() {
    let err = AppError::Core(CoreError::DistributionFailure(
        "ledger write hit connection reset on host db-internal-3".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "DISTRIBUTION_FAILURE");

    // The response body must NOT contain the original error details.
    let body_text = json.to_string();
    assert!(
        !body_text.contains("db-internal"),
        "Distribution failure response must not leak infrastructure details"
    );
    assert_eq!(
        json["error"],
        "Fund distribution failed; the booking was left unchanged"
    );
}

// ---------------------------------------------------------------------------
// Test: AppError::BadRequest maps to 400 with BAD_REQUEST code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("role must be CLIENT or STYLIST".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "role must be CLIENT or STYLIST");
}

// ---------------------------------------------------------------------------
// Test: AppError::InternalError maps to 500 and sanitizes the message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("secret database credentials leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");

    // The response body must NOT contain the original error details.
    let body_text = json.to_string();
    assert!(
        !body_text.contains("secret"),
        "Internal error response must not leak sensitive details"
    );
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: sqlx RowNotFound maps to 404 with a generic message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sqlx_row_not_found_returns_404() {
    let err = AppError::Database(sqlx::Error::RowNotFound);

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Resource not found");
}
