//! Command handlers for the session.
//!
//! Each handler takes a command, logs it with its correlation id and applies
//! it to the live session.

use std::sync::Arc;

use nightfall_core::command::Command;
use nightfall_core::error::DomainError;
use tracing::debug;
use uuid::Uuid;

use super::session::Session;
use crate::domain::commands::{
    CastVote, ConfigureGame, JoinVillage, ResetGame, StartGame, SubmitAction,
};

fn trace_command(command: &dyn Command) {
    debug!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        "handling command"
    );
}

/// Handles `JoinVillage`: adds the participant and returns their identifier.
///
/// # Errors
///
/// Returns `DomainError::Validation` once the game has started.
pub async fn handle_join(command: &JoinVillage, session: &Session) -> Result<Uuid, DomainError> {
    trace_command(command);
    session.join(&command.name).await
}

/// Handles `StartGame`: deals roles and starts the phase loop.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the game already started or too few
/// participants joined.
pub async fn handle_start(command: &StartGame, session: &Arc<Session>) -> Result<(), DomainError> {
    trace_command(command);
    session.start().await
}

/// Handles `ResetGame`. Always succeeds.
pub async fn handle_reset(command: &ResetGame, session: &Session) {
    trace_command(command);
    session.reset().await;
}

/// Handles `ConfigureGame`.
///
/// # Errors
///
/// Returns `DomainError::Validation` once the game has started.
pub async fn handle_configure(
    command: &ConfigureGame,
    session: &Session,
) -> Result<(), DomainError> {
    trace_command(command);
    session.configure(&command.patch).await
}

/// Handles `SubmitAction`. Returns whether the submission was recorded.
pub async fn handle_submit_action(command: &SubmitAction, session: &Session) -> bool {
    trace_command(command);
    session
        .submit_action(command.participant_id, command.action.clone())
        .await
}

/// Handles `CastVote`. Returns whether the vote was recorded.
pub async fn handle_cast_vote(command: &CastVote, session: &Session) -> bool {
    trace_command(command);
    session.cast_vote(command.voter_id, command.target_id).await
}
