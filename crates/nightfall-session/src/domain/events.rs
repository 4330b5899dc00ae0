//! Events pushed to viewers.

use chrono::{DateTime, Utc};
use nightfall_core::event::DomainEvent;
use serde::Serialize;
use uuid::Uuid;

use super::commands::NightStep;
use super::outcome::Outcome;
use super::roles::Role;
use super::views::{PrivateView, PublicView, RevealedParticipant, TallyEntry};

/// Body of an action request.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ActionPrompt {
    /// Prompt tag telling the client which form to show.
    pub action: &'static str,
}

/// Every message the session pushes, tagged by `type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    /// Greeting on a new push channel.
    Hello {
        client: String,
        player_id: Option<Uuid>,
    },
    /// Full public snapshot.
    PublicState { data: PublicView },
    /// Full private snapshot for one participant.
    PrivateState { data: Box<PrivateView> },
    /// One narration line, already time-stamped.
    NarratorLine { line: String },
    /// An eligible actor is asked to act.
    ActionRequest {
        step: NightStep,
        deadline: DateTime<Utc>,
        payload: ActionPrompt,
    },
    /// Cupid paired this participant.
    LoverAssigned { lover_id: Uuid, lover_name: String },
    /// The seer's answer.
    SeerResult {
        target_id: Uuid,
        target_name: String,
        role: Option<Role>,
        role_label: Option<&'static str>,
    },
    /// The witch's briefing before she decides.
    WitchContext {
        wolves_victim_id: Uuid,
        wolves_victim_name: String,
        heal_used: bool,
        poison_used: bool,
    },
    /// A countdown tick.
    Countdown { label: String, seconds_left: u64 },
    /// The vote window opened.
    VoteStarted { seconds: u64 },
    /// A vote-window tick.
    VoteStatus {
        received: usize,
        total: usize,
        seconds_left: u64,
    },
    /// Tally and elimination.
    VoteResult {
        tally: Vec<TallyEntry>,
        eliminated: Option<RevealedParticipant>,
    },
    /// The game ended.
    GameOver {
        winner: Outcome,
        winner_label: &'static str,
    },
    /// The session was wiped.
    Reset,
    /// Keep-alive answer.
    Pong,
}

impl DomainEvent for ServerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "HELLO",
            Self::PublicState { .. } => "PUBLIC_STATE",
            Self::PrivateState { .. } => "PRIVATE_STATE",
            Self::NarratorLine { .. } => "NARRATOR_LINE",
            Self::ActionRequest { .. } => "ACTION_REQUEST",
            Self::LoverAssigned { .. } => "LOVER_ASSIGNED",
            Self::SeerResult { .. } => "SEER_RESULT",
            Self::WitchContext { .. } => "WITCH_CONTEXT",
            Self::Countdown { .. } => "COUNTDOWN",
            Self::VoteStarted { .. } => "VOTE_STARTED",
            Self::VoteStatus { .. } => "VOTE_STATUS",
            Self::VoteResult { .. } => "VOTE_RESULT",
            Self::GameOver { .. } => "GAME_OVER",
            Self::Reset => "RESET",
            Self::Pong => "PONG",
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Every field serializes to JSON with string map keys.
        serde_json::to_value(self).expect("ServerEvent serialization is infallible")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_type_matches_event_type() {
        let events = [
            ServerEvent::NarratorLine {
                line: "[10:00:00] hi".to_owned(),
            },
            ServerEvent::Countdown {
                label: "Discussion".to_owned(),
                seconds_left: 3,
            },
            ServerEvent::GameOver {
                winner: Outcome::Villagers,
                winner_label: Outcome::Villagers.label(),
            },
            ServerEvent::Reset,
            ServerEvent::Pong,
        ];

        for event in events {
            assert_eq!(event.to_payload()["type"], event.event_type());
        }
    }

    #[test]
    fn test_action_request_payload_shape() {
        let deadline = Utc::now();
        let event = ServerEvent::ActionRequest {
            step: NightStep::Wolves,
            deadline,
            payload: ActionPrompt {
                action: NightStep::Wolves.prompt(),
            },
        };

        let payload = event.to_payload();

        assert_eq!(payload["type"], "ACTION_REQUEST");
        assert_eq!(payload["step"], "WOLVES");
        assert_eq!(payload["payload"]["action"], "wolf_vote_victim");
    }

    #[test]
    fn test_game_over_payload_uses_lowercase_winner() {
        let event = ServerEvent::GameOver {
            winner: Outcome::Werewolves,
            winner_label: Outcome::Werewolves.label(),
        };

        assert_eq!(event.to_payload()["winner"], "werewolves");
    }
}
