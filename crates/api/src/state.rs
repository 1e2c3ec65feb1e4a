use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: beautycita_db::DbPool,
    /// Server configuration (booking windows, sweep tuning, HTTP knobs).
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing booking events.
    pub event_bus: Arc<beautycita_events::EventBus>,
}
