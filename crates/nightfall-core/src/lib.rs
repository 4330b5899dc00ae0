//! Nightfall Core: shared abstractions.
//!
//! This crate defines the traits and types the session orchestrator and the
//! transport depend on: time, randomness, errors, commands, outbound events
//! and the message-delivery collaborator. It knows nothing about the game.

pub mod clock;
pub mod command;
pub mod delivery;
pub mod error;
pub mod event;
pub mod rng;
