//! User contact projection for notification delivery.

use sqlx::FromRow;

use beautycita_core::types::DbId;

/// The contact fields the notification router needs to reach a user.
#[derive(Debug, Clone, FromRow)]
pub struct UserContact {
    pub id: DbId,
    pub first_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}
