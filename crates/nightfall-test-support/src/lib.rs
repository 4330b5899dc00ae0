//! Shared test mocks and utilities for the Nightfall session server.

mod clock;
mod delivery;
mod rng;

pub use clock::{FixedClock, TokioClock};
pub use delivery::{RecordingDelivery, SilentDelivery};
pub use rng::{MockRng, SequenceRng};
