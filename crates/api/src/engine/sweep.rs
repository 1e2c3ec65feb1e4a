//! Periodic expiration sweep for time-boxed booking phases.
//!
//! Ticks on a fixed interval; each tick collects bookings whose phase
//! deadline has lapsed (soonest first, bounded per phase) and feeds them
//! through the settlement path one by one. Per-booking failures are logged
//! and never abort the batch; an unsettled booking keeps its past deadline
//! and is picked up again on the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use beautycita_core::distribution::Outcome;
use beautycita_core::lifecycle::ExpirationType;
use beautycita_core::types::{DbId, Timestamp};
use beautycita_db::repositories::BookingRepo;
use beautycita_db::DbPool;
use beautycita_events::{EventBus, BOOKING_EXPIRED};

use crate::config::SweepConfig;
use crate::engine::settlement::{publish_settled, SettleResult, Settlement};

/// Background task expiring bookings whose response windows lapsed.
pub struct ExpirationSweep {
    pool: DbPool,
    bus: Arc<EventBus>,
    config: SweepConfig,
}

impl ExpirationSweep {
    pub fn new(pool: DbPool, bus: Arc<EventBus>, config: SweepConfig) -> Self {
        Self { pool, bus, config }
    }

    /// Run the sweep loop until `cancel` is triggered.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            batch_size = self.config.batch_size,
            "Expiration sweep started"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_secs));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Expiration sweep stopping");
                    break;
                }
                _ = interval.tick() => {
                    let settled = self.tick().await;
                    if settled > 0 {
                        tracing::info!(settled, "Expiration sweep tick settled bookings");
                    } else {
                        tracing::debug!("Expiration sweep tick: nothing to settle");
                    }
                }
            }
        }
    }

    /// One sweep pass over both time-boxed phases. Returns the number of
    /// bookings settled.
    pub async fn tick(&self) -> usize {
        let now = Utc::now();
        let mut settled = 0;
        settled += self.sweep_phase(ExpirationType::StylistNoResponse, now).await;
        settled += self.sweep_phase(ExpirationType::ClientNoConfirm, now).await;
        settled
    }

    /// Sweep one phase: collect lapsed candidates, settle each individually.
    async fn sweep_phase(&self, expiration: ExpirationType, now: Timestamp) -> usize {
        let candidates = match self.collect(expiration, now).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    expiration = expiration.as_str(),
                    "Expiration sweep: candidate query failed"
                );
                return 0;
            }
        };

        let outcome = match expiration {
            ExpirationType::StylistNoResponse => Outcome::StylistNoResponse,
            ExpirationType::ClientNoConfirm => Outcome::ClientNoConfirm,
        };

        let mut settled = 0;
        for booking_id in candidates {
            match Settlement::apply_skip_locked(&self.pool, booking_id, outcome, now).await {
                Ok(SettleResult::Applied(done)) => {
                    publish_settled(&self.bus, BOOKING_EXPIRED, &done, outcome);
                    settled += 1;
                }
                Ok(SettleResult::Skipped) => {
                    tracing::debug!(
                        booking_id,
                        expiration = expiration.as_str(),
                        "Expiration sweep: booking settled by a concurrent actor, skipping"
                    );
                }
                Err(e) => {
                    // Deadline stays in the past; the next tick retries.
                    tracing::error!(
                        error = %e,
                        booking_id,
                        expiration = expiration.as_str(),
                        "Expiration sweep: settlement failed"
                    );
                }
            }
        }
        settled
    }

    async fn collect(
        &self,
        expiration: ExpirationType,
        now: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        match expiration {
            ExpirationType::StylistNoResponse => {
                BookingRepo::find_expired_stylist_responses(&self.pool, now, self.config.batch_size)
                    .await
            }
            ExpirationType::ClientNoConfirm => {
                BookingRepo::find_expired_client_confirmations(
                    &self.pool,
                    now,
                    self.config.batch_size,
                )
                .await
            }
        }
    }
}
