//! Notification routing infrastructure.
//!
//! The [`NotificationRouter`] subscribes to the event bus and delivers
//! booking events to the affected user over the configured channels.

pub mod router;

pub use router::NotificationRouter;
