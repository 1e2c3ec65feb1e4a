//! HTTP handler implementations, grouped by resource.

pub mod admin;
pub mod bookings;
pub mod credits;
