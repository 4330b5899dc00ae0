//! Nightfall: live session orchestrator.
//!
//! Runs one game of a werewolf-style social deduction party game: the phase
//! state machine, role assignment, time-boxed collection of night actions,
//! night and vote resolution, win evaluation, and the per-viewer projection
//! of what each connected screen may see.

pub mod application;
pub mod domain;
