use chrono::Duration;

use beautycita_core::lifecycle::{
    BookingWindows, DEFAULT_ACCEPTANCE_WINDOW_MINS, DEFAULT_PAYMENT_FIRST_TOTAL_WINDOW_MINS,
    DEFAULT_REQUEST_WINDOW_MINS,
};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Booking phase deadlines.
    pub windows: BookingWindows,
    /// Expiration sweep tuning.
    pub sweep: SweepConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `HOST`                         | `0.0.0.0`               |
    /// | `PORT`                         | `3000`                  |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                    |
    /// | `BOOKING_REQUEST_WINDOW_MINS`  | `5`                     |
    /// | `BOOKING_ACCEPT_WINDOW_MINS`   | `10`                    |
    /// | `BOOKING_TOTAL_WINDOW_MINS`    | `15`                    |
    /// | `SWEEP_INTERVAL_SECS`          | `60`                    |
    /// | `SWEEP_BATCH_SIZE`             | `50`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            windows: booking_windows_from_env(),
            sweep: SweepConfig::from_env(),
        }
    }
}

/// Read the booking phase deadlines, falling back to the core defaults.
fn booking_windows_from_env() -> BookingWindows {
    let minutes = |var: &str, default: i64| -> i64 {
        std::env::var(var)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    };

    BookingWindows {
        request: Duration::minutes(minutes(
            "BOOKING_REQUEST_WINDOW_MINS",
            DEFAULT_REQUEST_WINDOW_MINS,
        )),
        acceptance: Duration::minutes(minutes(
            "BOOKING_ACCEPT_WINDOW_MINS",
            DEFAULT_ACCEPTANCE_WINDOW_MINS,
        )),
        payment_first_total: Duration::minutes(minutes(
            "BOOKING_TOTAL_WINDOW_MINS",
            DEFAULT_PAYMENT_FIRST_TOTAL_WINDOW_MINS,
        )),
    }
}

/// Default sweep tick interval, in seconds.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Default maximum bookings settled per phase per tick.
const DEFAULT_SWEEP_BATCH_SIZE: i64 = 50;

/// Tuning for the expiration sweep background task.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    /// Seconds between sweep ticks.
    pub interval_secs: u64,
    /// Maximum bookings settled per phase per tick.
    pub batch_size: i64,
}

impl SweepConfig {
    /// Load sweep tuning from `SWEEP_INTERVAL_SECS` / `SWEEP_BATCH_SIZE`.
    pub fn from_env() -> Self {
        Self {
            interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
            batch_size: std::env::var("SWEEP_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SWEEP_BATCH_SIZE),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            batch_size: DEFAULT_SWEEP_BATCH_SIZE,
        }
    }
}
