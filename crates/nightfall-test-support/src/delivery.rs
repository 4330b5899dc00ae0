//! Test deliveries: mock `MessageDelivery` implementations for tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use nightfall_core::delivery::{Audience, MessageDelivery, Viewer};
use nightfall_core::error::DomainError;
use serde_json::Value;
use uuid::Uuid;

/// A delivery that records every message per viewer. Viewers can be marked
/// broken so that sends to them fail, which exercises deregistration.
#[derive(Debug, Default)]
pub struct RecordingDelivery {
    viewers: Mutex<Vec<Viewer>>,
    broken: Mutex<HashSet<Uuid>>,
    sent: Mutex<Vec<(Uuid, Value)>>,
}

impl RecordingDelivery {
    /// Creates a delivery with no registered viewers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a viewer for `audience` and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn register(&self, audience: Audience) -> Uuid {
        let viewer_id = Uuid::new_v4();
        self.viewers.lock().unwrap().push(Viewer {
            viewer_id,
            audience,
        });
        viewer_id
    }

    /// Makes every later send to `viewer_id` fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn break_viewer(&self, viewer_id: Uuid) {
        self.broken.lock().unwrap().insert(viewer_id);
    }

    /// Returns whether `viewer_id` is still registered.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn is_registered(&self, viewer_id: Uuid) -> bool {
        self.viewers
            .lock()
            .unwrap()
            .iter()
            .any(|v| v.viewer_id == viewer_id)
    }

    /// Returns every message delivered to `viewer_id`, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn messages_for(&self, viewer_id: Uuid) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == viewer_id)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Returns the messages of one wire type delivered to `viewer_id`.
    pub fn messages_of_type(&self, viewer_id: Uuid, event_type: &str) -> Vec<Value> {
        self.messages_for(viewer_id)
            .into_iter()
            .filter(|m| m["type"] == event_type)
            .collect()
    }
}

#[async_trait]
impl MessageDelivery for RecordingDelivery {
    fn viewers(&self) -> Vec<Viewer> {
        self.viewers.lock().unwrap().clone()
    }

    async fn send(&self, viewer_id: Uuid, message: &Value) -> Result<(), DomainError> {
        if self.broken.lock().unwrap().contains(&viewer_id) {
            return Err(DomainError::Delivery(format!("viewer {viewer_id} unreachable")));
        }
        self.sent.lock().unwrap().push((viewer_id, message.clone()));
        Ok(())
    }

    fn deregister(&self, viewer_id: Uuid) {
        self.viewers
            .lock()
            .unwrap()
            .retain(|v| v.viewer_id != viewer_id);
    }
}

/// A delivery with no viewers at all. Useful when a test only inspects
/// session state.
#[derive(Debug)]
pub struct SilentDelivery;

#[async_trait]
impl MessageDelivery for SilentDelivery {
    fn viewers(&self) -> Vec<Viewer> {
        Vec::new()
    }

    async fn send(&self, _viewer_id: Uuid, _message: &Value) -> Result<(), DomainError> {
        Ok(())
    }

    fn deregister(&self, _viewer_id: Uuid) {}
}
