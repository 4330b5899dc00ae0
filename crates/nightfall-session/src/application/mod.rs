//! Orchestration: the live `Session`, its phase loop and the handlers the
//! transport calls into.

pub mod collector;
pub mod command_handlers;
mod night;
mod phases;
pub mod query_handlers;
pub mod session;
