//! Domain logic for the BeautyCita booking marketplace.
//!
//! This crate has zero internal dependencies so it can be used by the
//! API/repository layer, background sweeps, and any future CLI tooling.
//! It contains:
//!
//! - [`lifecycle`]: the booking status state machine and phase-deadline
//!   guards shared by the HTTP handlers and the expiration sweep.
//! - [`policy`]: role-aware cancellation policy.
//! - [`distribution`]: the pure fund-distribution planner (platform fee,
//!   refunds, no-show splits) expressed in fixed-point decimals.
//! - [`error`]: the domain error taxonomy.

pub mod distribution;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod types;
