//! Outbound event abstractions.

/// Trait that all events pushed to viewers implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the wire type name of the event (e.g. `PUBLIC_STATE`).
    fn event_type(&self) -> &'static str;

    /// Serializes the event into the JSON message sent to viewers.
    fn to_payload(&self) -> serde_json::Value;
}
