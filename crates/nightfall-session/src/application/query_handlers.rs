//! Query handlers: per-viewer projections of the live session.
//!
//! Snapshots are computed from the village on every call and never stored.
//! The public projection carries no secret; the private one adds what the
//! participant's role and the current step entitle them to see.

use std::collections::BTreeMap;

use nightfall_core::clock::Clock;
use nightfall_core::error::DomainError;
use uuid::Uuid;

use crate::domain::aggregates::Village;
use crate::domain::commands::{NightAction, NightStep};
use crate::domain::participant::Participant;
use crate::domain::resolution::is_valid_prey;
use crate::domain::roles::Role;
use crate::domain::state::Phase;
use crate::domain::views::{
    LivingParticipant, PersonalBlock, PrivateView, PublicView, RevealedParticipant, Teammate,
    TimerView, WitchBriefing,
};

/// Public card of a dead participant, role revealed.
#[must_use]
pub fn reveal_card(participant: &Participant) -> RevealedParticipant {
    RevealedParticipant {
        id: participant.id,
        name: participant.name.clone(),
        alive: participant.is_alive(),
        role: participant.role(),
        role_label: participant.role().map(Role::label),
    }
}

/// Projects what the shared audience may see.
#[must_use]
pub fn project_public(village: &Village, clock: &dyn Clock) -> PublicView {
    let state = &village.state;
    let (living, dead): (Vec<&Participant>, Vec<&Participant>) = village
        .participants()
        .iter()
        .partition(|p| p.is_alive());

    PublicView {
        phase: state.phase,
        night_count: state.night_count,
        day_count: state.day_count,
        started: state.started,
        winner: state.outcome,
        alive: living
            .into_iter()
            .map(|p| LivingParticipant {
                id: p.id,
                name: p.name.clone(),
                alive: true,
            })
            .collect(),
        dead: dead.into_iter().map(reveal_card).collect(),
        timers: TimerView {
            phase_ends_at: state.phase_ends_at,
            seconds_left: state.phase_ends_at.map(|end| clock.seconds_until(end)),
        },
        narrator: state.narration.lines().cloned().collect(),
    }
}

/// Projects what one participant may see.
///
/// # Errors
///
/// Returns `DomainError::ParticipantNotFound` if nobody with this identifier
/// joined the session.
pub fn project_private(
    village: &Village,
    participant_id: Uuid,
    clock: &dyn Clock,
) -> Result<PrivateView, DomainError> {
    let me = village
        .participant(participant_id)
        .ok_or(DomainError::ParticipantNotFound(participant_id))?;
    let state = &village.state;
    let now = clock.now();
    let active = if state.phase == Phase::Night {
        state.inbox.active_step(now)
    } else {
        None
    };

    let acting = active.filter(|step| {
        me.is_alive() && me.has_role(step.actor_role()) && state.inbox.is_eligible(me.id)
    });
    let is_wolf = me.has_role(Role::Werewolf);

    let wolves_team = is_wolf.then(|| {
        village
            .participants()
            .iter()
            .filter(|p| p.is_alive() && p.has_role(Role::Werewolf))
            .map(|p| Teammate {
                id: p.id,
                name: p.name.clone(),
            })
            .collect()
    });

    let wolves_votes = (is_wolf && active == Some(NightStep::Wolves)).then(|| {
        village
            .participants()
            .iter()
            .filter(|p| p.is_alive() && p.has_role(Role::Werewolf))
            .map(|wolf| {
                let target = state
                    .inbox
                    .received()
                    .get(&wolf.id)
                    .and_then(NightAction::hunt_target)
                    .filter(|t| is_valid_prey(village, *t));
                (wolf.id, target)
            })
            .collect::<BTreeMap<_, _>>()
    });

    let witch_ctx = (me.is_alive() && me.has_role(Role::Witch) && state.phase == Phase::Night)
        .then_some(state.night.victim)
        .flatten()
        .map(|victim| WitchBriefing {
            victim_id: victim,
            victim_name: village.name_of(victim),
        });

    Ok(PrivateView {
        public: project_public(village, clock),
        me: PersonalBlock {
            id: me.id,
            name: me.name.clone(),
            alive: me.is_alive(),
            role: me.role(),
            role_label: me.role().map(Role::label),
            lover_id: me.partner(),
            witch_heal_used: me.heal_used(),
            witch_poison_used: me.poison_used(),
        },
        lover_name: me.partner().map(|id| village.name_of(id)),
        pending_step: acting,
        pending_deadline: acting.and(state.inbox.deadline()),
        wolves_team,
        wolves_votes,
        witch_ctx,
    })
}
