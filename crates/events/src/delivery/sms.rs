//! SMS notification delivery via the provider's HTTP API.
//!
//! [`SmsDelivery`] POSTs a JSON message to the configured SMS gateway with
//! retry. Configuration comes from environment variables; if
//! `SMS_GATEWAY_URL` is not set, [`SmsConfig::from_env`] returns `None`
//! and no sender should be constructed.

use std::time::Duration;

use crate::bus::BookingEvent;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for SMS delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("SMS gateway returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// SmsConfig
// ---------------------------------------------------------------------------

/// Configuration for the SMS gateway.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    /// Gateway endpoint that accepts `{ to, body }` JSON messages.
    pub gateway_url: String,
    /// Optional bearer token for the gateway.
    pub api_token: Option<String>,
}

impl SmsConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMS_GATEWAY_URL` is not set, signalling that SMS
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable          | Required |
    /// |-------------------|----------|
    /// | `SMS_GATEWAY_URL` | yes      |
    /// | `SMS_API_TOKEN`   | no       |
    pub fn from_env() -> Option<Self> {
        let gateway_url = std::env::var("SMS_GATEWAY_URL").ok()?;
        Some(Self {
            gateway_url,
            api_token: std::env::var("SMS_API_TOKEN").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// SmsDelivery
// ---------------------------------------------------------------------------

/// Sends booking notification texts through the SMS gateway.
pub struct SmsDelivery {
    config: SmsConfig,
    client: reqwest::Client,
}

impl SmsDelivery {
    /// Create a new delivery service with a pre-configured HTTP client.
    pub fn new(config: SmsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { config, client }
    }

    /// Deliver a notification text for the given event with retry.
    ///
    /// Retries up to 3 times with exponential backoff before giving up.
    /// Returns `Ok(())` on the first successful attempt.
    pub async fn deliver(&self, to_phone: &str, event: &BookingEvent) -> Result<(), SmsError> {
        let payload = serde_json::json!({
            "to": to_phone,
            "body": render_sms_body(event),
        });

        let mut last_err: Option<SmsError> = None;

        for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match self.try_send(&payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        event_type = %event.event_type,
                        error = %e,
                        "SMS delivery attempt failed, retrying"
                    );
                    last_err = Some(e);
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
            }
        }

        // Final attempt after the last backoff.
        match self.try_send(&payload).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(
                    event_type = %event.event_type,
                    error = %e,
                    "SMS delivery failed after all retries"
                );
                Err(last_err.unwrap_or(e))
            }
        }
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, payload: &serde_json::Value) -> Result<(), SmsError> {
        let mut request = self.client.post(&self.config.gateway_url).json(payload);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SmsError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Short human-readable text for an event.
fn render_sms_body(event: &BookingEvent) -> String {
    let service = event
        .payload
        .get("service_name")
        .and_then(|v| v.as_str())
        .unwrap_or("your appointment");

    match event.event_type.as_str() {
        crate::bus::BOOKING_CREATED => {
            format!("BeautyCita: new booking request for {service}.")
        }
        crate::bus::BOOKING_ACCEPTED => format!(
            "BeautyCita: your request for {service} was accepted. Please confirm to lock it in."
        ),
        crate::bus::BOOKING_DECLINED => {
            format!("BeautyCita: your request for {service} was declined. You have been refunded.")
        }
        crate::bus::BOOKING_CONFIRMED => format!("BeautyCita: {service} is confirmed."),
        crate::bus::BOOKING_COMPLETED => {
            format!("BeautyCita: {service} is complete. Your payout has been credited.")
        }
        crate::bus::BOOKING_CANCELLED => format!("BeautyCita: {service} was cancelled."),
        crate::bus::BOOKING_EXPIRED => {
            format!("BeautyCita: your booking for {service} expired and was refunded.")
        }
        other => format!("BeautyCita: update on {service} ({other})."),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
