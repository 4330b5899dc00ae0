//! Snapshot shapes sent to viewers. Built fresh for every push.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::commands::NightStep;
use super::outcome::Outcome;
use super::roles::Role;
use super::state::Phase;

/// A living participant as everyone sees them.
#[derive(Debug, Clone, Serialize)]
pub struct LivingParticipant {
    pub id: Uuid,
    pub name: String,
    pub alive: bool,
}

/// A dead participant; the role is revealed on death.
#[derive(Debug, Clone, Serialize)]
pub struct RevealedParticipant {
    pub id: Uuid,
    pub name: String,
    pub alive: bool,
    pub role: Option<Role>,
    pub role_label: Option<&'static str>,
}

/// Countdown projection of the running timed phase.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TimerView {
    pub phase_ends_at: Option<DateTime<Utc>>,
    pub seconds_left: Option<u64>,
}

/// What the shared screen may see.
#[derive(Debug, Clone, Serialize)]
pub struct PublicView {
    pub phase: Phase,
    pub night_count: u32,
    pub day_count: u32,
    pub started: bool,
    pub winner: Option<Outcome>,
    pub alive: Vec<LivingParticipant>,
    pub dead: Vec<RevealedParticipant>,
    pub timers: TimerView,
    pub narrator: Vec<String>,
}

/// The viewer's own secrets.
#[derive(Debug, Clone, Serialize)]
pub struct PersonalBlock {
    pub id: Uuid,
    pub name: String,
    pub alive: bool,
    pub role: Option<Role>,
    pub role_label: Option<&'static str>,
    pub lover_id: Option<Uuid>,
    pub witch_heal_used: bool,
    pub witch_poison_used: bool,
}

/// A fellow werewolf.
#[derive(Debug, Clone, Serialize)]
pub struct Teammate {
    pub id: Uuid,
    pub name: String,
}

/// The werewolves' pending victim, shown to the witch.
#[derive(Debug, Clone, Serialize)]
pub struct WitchBriefing {
    pub victim_id: Uuid,
    pub victim_name: String,
}

/// What one participant may see.
#[derive(Debug, Clone, Serialize)]
pub struct PrivateView {
    #[serde(flatten)]
    pub public: PublicView,
    pub me: PersonalBlock,
    pub lover_name: Option<String>,
    pub pending_step: Option<NightStep>,
    pub pending_deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wolves_team: Option<Vec<Teammate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wolves_votes: Option<BTreeMap<Uuid, Option<Uuid>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witch_ctx: Option<WitchBriefing>,
}

/// One row of the public vote tally.
#[derive(Debug, Clone, Serialize)]
pub struct TallyEntry {
    pub id: Uuid,
    pub name: String,
    pub votes: usize,
}
