//! Event-to-notification routing.
//!
//! [`NotificationRouter`] subscribes to the event bus and, for each event
//! that targets a user, resolves their contact details and delivers over
//! whichever channels are configured (SMS gateway, SMTP email). Delivery
//! failures are logged and swallowed: by the time an event reaches this
//! loop the financial state change behind it has already committed.

use tokio::sync::broadcast;

use beautycita_db::repositories::UserRepo;
use beautycita_db::DbPool;
use beautycita_events::{
    BookingEvent, EmailConfig, EmailDelivery, SmsConfig, SmsDelivery,
};

/// Routes booking events to user notifications.
pub struct NotificationRouter {
    pool: DbPool,
    sms: Option<SmsDelivery>,
    email: Option<EmailDelivery>,
}

impl NotificationRouter {
    /// Create a router with channels built from the environment. A channel
    /// whose configuration is absent is simply skipped at delivery time.
    pub fn from_env(pool: DbPool) -> Self {
        let sms = SmsConfig::from_env().map(SmsDelivery::new);
        let email = EmailConfig::from_env().map(EmailDelivery::new);

        tracing::info!(
            sms = sms.is_some(),
            email = email.is_some(),
            "Notification channels configured"
        );

        Self { pool, sms, email }
    }

    /// Run the main routing loop.
    ///
    /// Subscribes to the event bus via `receiver` and processes each event.
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](beautycita_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<BookingEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.route_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one event to its target user, if it has one.
    async fn route_event(&self, event: &BookingEvent) {
        let Some(user_id) = event.notify_user_id else {
            return;
        };

        let contact = match UserRepo::contact(&self.pool, user_id).await {
            Ok(Some(c)) => c,
            Ok(None) => {
                tracing::warn!(user_id, "Notification target unknown or inactive, skipping");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, user_id, "Contact lookup failed");
                return;
            }
        };

        if let (Some(sms), Some(phone)) = (&self.sms, contact.phone.as_deref()) {
            if let Err(e) = sms.deliver(phone, event).await {
                tracing::error!(
                    error = %e,
                    user_id,
                    event_type = %event.event_type,
                    "SMS notification failed"
                );
            }
        }

        if let (Some(email), Some(address)) = (&self.email, contact.email.as_deref()) {
            if let Err(e) = email.deliver(address, event).await {
                tracing::error!(
                    error = %e,
                    user_id,
                    event_type = %event.event_type,
                    "Email notification failed"
                );
            }
        }
    }
}
