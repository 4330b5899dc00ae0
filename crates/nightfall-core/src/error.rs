//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Only requests that the caller can act on surface as errors. Stale or
/// mismatched submissions are dropped without one.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No participant with this identifier has joined the session.
    #[error("participant not found: {0}")]
    ParticipantNotFound(Uuid),

    /// A request was refused by a session rule (e.g. too few participants).
    #[error("validation error: {0}")]
    Validation(String),

    /// A message could not be delivered to one viewer.
    #[error("delivery error: {0}")]
    Delivery(String),
}
