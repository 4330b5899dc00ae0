//! Nightfall: HTTP and WebSocket transport.
//!
//! A thin adapter: JSON routes translate requests into session commands, and
//! the viewer hub carries pushed events to connected screens.

pub mod error;
pub mod hub;
pub mod routes;
pub mod state;
