use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    #[error("Distribution failure: {0}")]
    DistributionFailure(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
