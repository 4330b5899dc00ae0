//! Pure game data and rules. Nothing in here waits, sends or reads a clock.

pub mod aggregates;
pub mod commands;
pub mod config;
pub mod events;
pub mod outcome;
pub mod participant;
pub mod resolution;
pub mod roles;
pub mod state;
pub mod views;
