//! Repository for user lookups.

use sqlx::PgPool;

use beautycita_core::types::DbId;

use crate::models::user::UserContact;

/// Provides read access to user contact details.
pub struct UserRepo;

impl UserRepo {
    /// The contact fields for a user, if the account exists and is active.
    pub async fn contact(pool: &PgPool, user_id: DbId) -> Result<Option<UserContact>, sqlx::Error> {
        sqlx::query_as::<_, UserContact>(
            "SELECT id, first_name, phone, email \
             FROM users WHERE id = $1 AND is_active = TRUE",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
