//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`BookingEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use beautycita_core::types::DbId;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

pub const BOOKING_CREATED: &str = "booking.created";
pub const BOOKING_ACCEPTED: &str = "booking.accepted";
pub const BOOKING_DECLINED: &str = "booking.declined";
pub const BOOKING_CONFIRMED: &str = "booking.confirmed";
pub const BOOKING_CANCELLED: &str = "booking.cancelled";
pub const BOOKING_COMPLETED: &str = "booking.completed";
pub const BOOKING_EXPIRED: &str = "booking.expired";
pub const WITHDRAWAL_REQUESTED: &str = "credits.withdrawal_requested";

// ---------------------------------------------------------------------------
// BookingEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred on the marketplace.
///
/// Constructed via [`BookingEvent::new`] and enriched with the builder
/// methods [`for_booking`](BookingEvent::for_booking),
/// [`notify_user`](BookingEvent::notify_user), and
/// [`with_payload`](BookingEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    /// Dot-separated event name, e.g. `"booking.expired"`.
    pub event_type: String,

    /// The booking this event concerns, when there is one.
    pub booking_id: Option<DbId>,

    /// The user to notify about the event, when delivery is wanted.
    pub notify_user_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data
    /// (service name, appointment date/time, amounts).
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl BookingEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            booking_id: None,
            notify_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the originating booking.
    pub fn for_booking(mut self, booking_id: DbId) -> Self {
        self.booking_id = Some(booking_id);
        self
    }

    /// Mark which user the notification router should deliver to.
    pub fn notify_user(mut self, user_id: DbId) -> Self {
        self.notify_user_id = Some(user_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`BookingEvent`].
pub struct EventBus {
    sender: broadcast::Sender<BookingEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// notifications are best-effort by contract.
    pub fn publish(&self, event: BookingEvent) {
        // The SendError only means there are zero receivers right now.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            BookingEvent::new(BOOKING_EXPIRED)
                .for_booking(7)
                .notify_user(3),
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, BOOKING_EXPIRED);
        assert_eq!(event.booking_id, Some(7));
        assert_eq!(event.notify_user_id, Some(3));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let bus = EventBus::default();
        // No receiver; must not panic or block.
        bus.publish(BookingEvent::new(BOOKING_CREATED));
    }

    #[tokio::test]
    async fn each_subscriber_gets_every_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(BookingEvent::new(BOOKING_CONFIRMED).for_booking(1));

        assert_eq!(rx1.recv().await.unwrap().booking_id, Some(1));
        assert_eq!(rx2.recv().await.unwrap().booking_id, Some(1));
    }

    #[test]
    fn builder_defaults_are_empty() {
        let event = BookingEvent::new("booking.created");
        assert!(event.booking_id.is_none());
        assert!(event.notify_user_id.is_none());
        assert!(event.payload.as_object().unwrap().is_empty());
    }
}
