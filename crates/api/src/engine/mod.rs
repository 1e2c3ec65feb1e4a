//! The settlement engine and expiration sweep.
//!
//! [`settlement`] owns the single transactional path that moves a booking
//! to a terminal status and applies its fund distribution; [`sweep`] is the
//! background task that feeds deadline-lapsed bookings into it.

pub mod settlement;
pub mod sweep;

pub use settlement::{publish_settled, CancelAudit, SettleResult, Settled, Settlement};
pub use sweep::ExpirationSweep;
