//! Night and vote resolution, plus the interpretation of each role's
//! submission. Randomness only enters through the injected RNG.

use std::collections::HashMap;

use nightfall_core::rng::{DeterministicRng, choose};
use uuid::Uuid;

use super::aggregates::Village;
use super::commands::NightAction;
use super::roles::Role;

/// How the werewolves' victim was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WolvesVerdict {
    /// Picked from the leader set of valid votes.
    Chosen(Uuid),
    /// No valid vote; hunger picked a random non-werewolf.
    Starved(Uuid),
    /// Nobody left to eat.
    NoPrey,
}

impl WolvesVerdict {
    #[must_use]
    pub fn victim(self) -> Option<Uuid> {
        match self {
            Self::Chosen(id) | Self::Starved(id) => Some(id),
            Self::NoPrey => None,
        }
    }
}

/// A werewolf may only target a living non-werewolf.
#[must_use]
pub fn is_valid_prey(village: &Village, target: Uuid) -> bool {
    village
        .participant(target)
        .is_some_and(|p| p.is_alive() && !p.has_role(Role::Werewolf))
}

/// Valid targets submitted by the still-alive `hunters`, in hunter order.
fn valid_hunt_targets(
    village: &Village,
    received: &HashMap<Uuid, NightAction>,
    hunters: &[Uuid],
) -> Vec<Uuid> {
    hunters
        .iter()
        .filter(|id| village.is_alive(**id))
        .filter_map(|id| received.get(id).and_then(NightAction::hunt_target))
        .filter(|target| is_valid_prey(village, *target))
        .collect()
}

/// True once every alive hunter has a valid vote and all votes agree.
#[must_use]
pub fn wolves_unanimous(
    village: &Village,
    received: &HashMap<Uuid, NightAction>,
    hunters: &[Uuid],
) -> bool {
    let alive = hunters.iter().filter(|id| village.is_alive(**id)).count();
    let targets = valid_hunt_targets(village, received, hunters);
    alive > 0 && targets.len() == alive && targets.windows(2).all(|w| w[0] == w[1])
}

/// Candidates tied for the highest count, with their counts, in join order.
fn tally_in_join_order(village: &Village, picks: &[Uuid]) -> Vec<(Uuid, usize)> {
    village
        .participants()
        .iter()
        .map(|p| (p.id, picks.iter().filter(|t| **t == p.id).count()))
        .filter(|(_, count)| *count > 0)
        .collect()
}

fn leaders(tally: &[(Uuid, usize)]) -> Vec<Uuid> {
    let max = tally.iter().map(|(_, c)| *c).max().unwrap_or(0);
    tally
        .iter()
        .filter(|(_, c)| *c == max)
        .map(|(id, _)| *id)
        .collect()
}

/// Picks the night's victim from the werewolves' submissions.
pub fn resolve_wolves(
    village: &Village,
    received: &HashMap<Uuid, NightAction>,
    hunters: &[Uuid],
    rng: &mut dyn DeterministicRng,
) -> WolvesVerdict {
    let votes = valid_hunt_targets(village, received, hunters);
    if !votes.is_empty() {
        let tally = tally_in_join_order(village, &votes);
        if let Some(victim) = choose(rng, &leaders(&tally)) {
            return WolvesVerdict::Chosen(*victim);
        }
    }

    let prey: Vec<Uuid> = village
        .participants()
        .iter()
        .filter(|p| p.is_alive() && !p.has_role(Role::Werewolf))
        .map(|p| p.id)
        .collect();
    choose(rng, &prey).map_or(WolvesVerdict::NoPrey, |id| WolvesVerdict::Starved(*id))
}

/// Applies cupid's pick. Returns the couple if one was formed.
pub fn apply_pairing(village: &mut Village, action: &NightAction) -> Option<(Uuid, Uuid)> {
    let NightAction::Pair { targets } = action else {
        return None;
    };
    let mut lovers: Vec<Uuid> = Vec::with_capacity(2);
    for target in targets {
        if village.is_alive(*target) && !lovers.contains(target) {
            lovers.push(*target);
        }
    }
    match lovers[..] {
        [a, b] if village.pair(a, b) => Some((a, b)),
        _ => None,
    }
}

/// The seer's answer: the living target and their role.
#[must_use]
pub fn reveal(village: &Village, action: &NightAction) -> Option<(Uuid, Option<Role>)> {
    let NightAction::Reveal {
        target: Some(target),
    } = action
    else {
        return None;
    };
    village
        .participant(*target)
        .filter(|p| p.is_alive())
        .map(|p| (p.id, p.role()))
}

/// Applies the witch's decision to the night scratch, spending potions.
pub fn apply_brew(village: &mut Village, witch: Uuid, action: &NightAction) {
    let NightAction::Brew {
        heal,
        poison_target,
    } = action
    else {
        return;
    };
    let poison_target = poison_target.filter(|t| village.is_alive(*t));
    let Some(brewer) = village.participant_mut(witch) else {
        return;
    };

    let healed = *heal && brewer.spend_heal();
    let poisoned = poison_target.filter(|_| brewer.spend_poison());

    if healed {
        village.state.night.healed = true;
    }
    if poisoned.is_some() {
        village.state.night.poison_target = poisoned;
    }
}

/// Deaths of one night.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightReport {
    /// Killed by the werewolves or poisoned, in join order.
    pub direct: Vec<Uuid>,
    /// `(lover, cause)`: died of heartbreak over `cause`.
    pub heartbreak: Vec<(Uuid, Uuid)>,
}

impl NightReport {
    #[must_use]
    pub fn is_peaceful(&self) -> bool {
        self.direct.is_empty() && self.heartbreak.is_empty()
    }

    #[must_use]
    pub fn deaths(&self) -> Vec<Uuid> {
        self.direct
            .iter()
            .copied()
            .chain(self.heartbreak.iter().map(|(lover, _)| *lover))
            .collect()
    }
}

/// Computes the night's deaths from the scratch state, expands them along
/// pairings to a fixed point, then kills everyone at once.
pub fn resolve_night(village: &mut Village) -> NightReport {
    let scratch = village.state.night;
    let unprotected = scratch.victim.filter(|_| !scratch.healed);

    let direct: Vec<Uuid> = village
        .participants()
        .iter()
        .filter(|p| p.is_alive())
        .filter(|p| unprotected == Some(p.id) || scratch.poison_target == Some(p.id))
        .map(|p| p.id)
        .collect();

    let mut removed = direct.clone();
    let mut heartbreak = Vec::new();
    let mut cursor = 0;
    while let Some(&dead) = removed.get(cursor) {
        cursor += 1;
        let Some(lover) = village.participant(dead).and_then(|p| p.partner()) else {
            continue;
        };
        if village.is_alive(lover) && !removed.contains(&lover) {
            removed.push(lover);
            heartbreak.push((lover, dead));
        }
    }

    village.kill(&removed);
    NightReport { direct, heartbreak }
}

/// Result of a day vote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteReport {
    /// Valid votes per target, highest first.
    pub tally: Vec<(Uuid, usize)>,
    pub eliminated: Option<Uuid>,
}

/// Tallies votes from living voters for living targets and eliminates one
/// participant. Without any valid vote someone alive is picked at random.
pub fn resolve_vote(village: &mut Village, rng: &mut dyn DeterministicRng) -> VoteReport {
    let votes = village.state.vote_box.votes();
    let picks: Vec<Uuid> = village
        .participants()
        .iter()
        .filter(|voter| voter.is_alive())
        .filter_map(|voter| votes.get(&voter.id).copied())
        .filter(|target| village.is_alive(*target))
        .collect();

    let mut tally = tally_in_join_order(village, &picks);
    let eliminated = if tally.is_empty() {
        choose(rng, &village.alive_ids()).copied()
    } else {
        choose(rng, &leaders(&tally)).copied()
    };
    tally.sort_by(|a, b| b.1.cmp(&a.1));

    if let Some(id) = eliminated {
        village.kill(&[id]);
    }
    VoteReport { tally, eliminated }
}
