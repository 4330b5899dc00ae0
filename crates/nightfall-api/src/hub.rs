//! In-process registry of connected screens.
//!
//! Each WebSocket connection registers a bounded channel here. The session
//! sees the hub only through `MessageDelivery`; a full or closed channel is
//! reported as a delivery failure, which makes the session drop the viewer.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use nightfall_core::delivery::{Audience, MessageDelivery, Viewer};
use nightfall_core::error::DomainError;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Messages buffered per connection before it counts as unreachable.
pub const CONNECTION_CHANNEL_BUFFER: usize = 256;

struct Channel {
    audience: Audience,
    sender: mpsc::Sender<Value>,
}

/// Registry of viewer channels.
#[derive(Default)]
pub struct ViewerHub {
    channels: RwLock<HashMap<Uuid, Channel>>,
}

impl ViewerHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new viewer and returns it with the receiving end of its
    /// channel.
    pub fn register(&self, audience: Audience) -> (Viewer, mpsc::Receiver<Value>) {
        let (sender, receiver) = mpsc::channel(CONNECTION_CHANNEL_BUFFER);
        let viewer = Viewer {
            viewer_id: Uuid::new_v4(),
            audience,
        };
        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(viewer.viewer_id, Channel { audience, sender });
        (viewer, receiver)
    }

    /// Number of registered viewers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MessageDelivery for ViewerHub {
    fn viewers(&self) -> Vec<Viewer> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(viewer_id, channel)| Viewer {
                viewer_id: *viewer_id,
                audience: channel.audience,
            })
            .collect()
    }

    async fn send(&self, viewer_id: Uuid, message: &Value) -> Result<(), DomainError> {
        let sender = self
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&viewer_id)
            .map(|channel| channel.sender.clone())
            .ok_or_else(|| DomainError::Delivery(format!("viewer {viewer_id} is not registered")))?;
        sender
            .try_send(message.clone())
            .map_err(|e| DomainError::Delivery(format!("viewer {viewer_id}: {e}")))
    }

    fn deregister(&self, viewer_id: Uuid) {
        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&viewer_id);
    }
}
