//! Commands accepted by the session, and the typed night-step payloads.

use nightfall_core::command::Command;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::ConfigurePatch;
use super::roles::Role;

/// A named, time-boxed sub-phase of the night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NightStep {
    /// Cupid pairs two lovers (first night only).
    Cupid,
    /// The werewolves vote on a victim.
    Wolves,
    /// The seer inspects one participant.
    Seer,
    /// The witch decides on her potions.
    Witch,
}

impl NightStep {
    /// The role whose living holders act during this step.
    #[must_use]
    pub fn actor_role(self) -> Role {
        match self {
            Self::Cupid => Role::Cupid,
            Self::Wolves => Role::Werewolf,
            Self::Seer => Role::Seer,
            Self::Witch => Role::Witch,
        }
    }

    /// Prompt tag sent with the action request.
    #[must_use]
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Cupid => "cupid_pick_two",
            Self::Wolves => "wolf_vote_victim",
            Self::Seer => "seer_pick_one",
            Self::Witch => "witch_decide",
        }
    }
}

/// Payload of one night-step submission, one variant per step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NightAction {
    /// Cupid's two picks.
    Pair { targets: Vec<Uuid> },
    /// One werewolf's vote.
    Hunt { target: Option<Uuid> },
    /// The seer's pick.
    Reveal { target: Option<Uuid> },
    /// The witch's potions.
    Brew {
        heal: bool,
        poison_target: Option<Uuid>,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PairData {
    targets: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TargetData {
    target: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BrewData {
    heal: bool,
    poison_target: Option<Uuid>,
}

impl NightAction {
    /// The step this payload belongs to.
    #[must_use]
    pub fn step(&self) -> NightStep {
        match self {
            Self::Pair { .. } => NightStep::Cupid,
            Self::Hunt { .. } => NightStep::Wolves,
            Self::Reveal { .. } => NightStep::Seer,
            Self::Brew { .. } => NightStep::Witch,
        }
    }

    /// The do-nothing payload for `step`.
    #[must_use]
    pub fn empty(step: NightStep) -> Self {
        match step {
            NightStep::Cupid => Self::Pair {
                targets: Vec::new(),
            },
            NightStep::Wolves => Self::Hunt { target: None },
            NightStep::Seer => Self::Reveal { target: None },
            NightStep::Witch => Self::Brew {
                heal: false,
                poison_target: None,
            },
        }
    }

    /// Reads the client's loosely-typed payload for `step`. Anything that
    /// does not parse becomes the empty payload for that step.
    #[must_use]
    pub fn from_step_data(step: NightStep, data: serde_json::Value) -> Self {
        let parsed = match step {
            NightStep::Cupid => {
                serde_json::from_value::<PairData>(data).map(|d| Self::Pair { targets: d.targets })
            }
            NightStep::Wolves => {
                serde_json::from_value::<TargetData>(data).map(|d| Self::Hunt { target: d.target })
            }
            NightStep::Seer => serde_json::from_value::<TargetData>(data)
                .map(|d| Self::Reveal { target: d.target }),
            NightStep::Witch => serde_json::from_value::<BrewData>(data).map(|d| Self::Brew {
                heal: d.heal,
                poison_target: d.poison_target,
            }),
        };
        parsed.unwrap_or_else(|_| Self::empty(step))
    }

    /// The single target of a werewolf vote, if this is one.
    #[must_use]
    pub fn hunt_target(&self) -> Option<Uuid> {
        match self {
            Self::Hunt { target } => *target,
            _ => None,
        }
    }
}

/// Command to join the lobby.
#[derive(Debug, Clone)]
pub struct JoinVillage {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Requested display name.
    pub name: String,
}

impl Command for JoinVillage {
    fn command_type(&self) -> &'static str {
        "session.join"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to deal roles and start the phase loop.
#[derive(Debug, Clone)]
pub struct StartGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for StartGame {
    fn command_type(&self) -> &'static str {
        "session.start"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to wipe the session back to an empty lobby.
#[derive(Debug, Clone)]
pub struct ResetGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for ResetGame {
    fn command_type(&self) -> &'static str {
        "session.reset"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to change timings or optional roles before the start.
#[derive(Debug, Clone)]
pub struct ConfigureGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Fields to change.
    pub patch: ConfigurePatch,
}

impl Command for ConfigureGame {
    fn command_type(&self) -> &'static str {
        "session.configure"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command carrying one participant's night-step submission.
#[derive(Debug, Clone)]
pub struct SubmitAction {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Who submits.
    pub participant_id: Uuid,
    /// What they submit; the variant names the step.
    pub action: NightAction,
}

impl Command for SubmitAction {
    fn command_type(&self) -> &'static str {
        "session.submit_action"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command carrying one day vote.
#[derive(Debug, Clone)]
pub struct CastVote {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Who votes.
    pub voter_id: Uuid,
    /// Whom they vote against.
    pub target_id: Uuid,
}

impl Command for CastVote {
    fn command_type(&self) -> &'static str {
        "session.cast_vote"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
