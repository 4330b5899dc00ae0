//! Message-delivery collaborator.
//!
//! The session never talks to sockets directly. It sees a registry of viewer
//! channels, each belonging either to the shared (narrator) audience or to a
//! specific participant, and sends JSON messages to them one by one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Who a viewer channel is watching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// The shared narrator screen: public information only.
    Shared,
    /// One participant's private screen.
    Participant(Uuid),
}

/// A registered viewer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    /// Identifier of the channel (not of the participant).
    pub viewer_id: Uuid,
    /// Audience the channel belongs to.
    pub audience: Audience,
}

impl Viewer {
    /// Returns the participant this viewer belongs to, if any.
    #[must_use]
    pub fn participant_id(&self) -> Option<Uuid> {
        match self.audience {
            Audience::Shared => None,
            Audience::Participant(id) => Some(id),
        }
    }
}

/// Registry of viewer channels plus best-effort delivery to each one.
#[async_trait]
pub trait MessageDelivery: Send + Sync {
    /// Returns a snapshot of the currently registered viewers.
    fn viewers(&self) -> Vec<Viewer>;

    /// Sends one message to one viewer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Delivery` if the viewer can no longer be reached.
    async fn send(&self, viewer_id: Uuid, message: &serde_json::Value)
    -> Result<(), DomainError>;

    /// Removes a viewer from the registry. Unknown ids are ignored.
    fn deregister(&self, viewer_id: Uuid);
}
