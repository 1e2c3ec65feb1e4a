//! External delivery channels for booking notifications.
//!
//! Both channels are fire-and-forget from the core's point of view:
//! callers log failures and move on, and no delivery error can affect a
//! booking's state.

pub mod email;
pub mod sms;
