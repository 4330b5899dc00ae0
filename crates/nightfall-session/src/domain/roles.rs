//! Roles and the role deal.

use nightfall_core::error::DomainError;
use nightfall_core::rng::{DeterministicRng, shuffle};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::EnabledRoles;

/// Fewest participants a game can start with.
pub const MIN_PARTICIPANTS: usize = 5;

/// Werewolf count by participant-count range (inclusive bounds).
const WEREWOLF_COUNT_RANGES: [(usize, usize, usize); 4] =
    [(5, 7, 1), (8, 11, 2), (12, 15, 3), (16, usize::MAX, 4)];

/// A participant's secret role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Filler role, no night power.
    Villager,
    /// Mass role; the pack picks a victim every night.
    Werewolf,
    /// Unique role; learns one participant's role per night.
    Seer,
    /// Unique role; one heal potion and one poison potion per game.
    Witch,
    /// Unique role; pairs two lovers on the first night.
    Cupid,
}

impl Role {
    /// Human-readable role name shown on screens and in narration.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Villager => "Villager",
            Self::Werewolf => "Werewolf",
            Self::Seer => "Seer",
            Self::Witch => "Witch",
            Self::Cupid => "Cupid",
        }
    }
}

/// Number of werewolves for a given participant count.
///
/// Counts below the smallest documented range get one werewolf.
#[must_use]
pub fn werewolf_count(participants: usize) -> usize {
    WEREWOLF_COUNT_RANGES
        .iter()
        .find(|(min, max, _)| (*min..=*max).contains(&participants))
        .map_or(1, |(_, _, wolves)| *wolves)
}

/// Builds the unshuffled role multiset for `participants` seats.
#[must_use]
pub fn role_deck(participants: usize, enabled: EnabledRoles) -> Vec<Role> {
    let mut deck = vec![Role::Werewolf; werewolf_count(participants)];
    if enabled.seer {
        deck.push(Role::Seer);
    }
    if enabled.witch {
        deck.push(Role::Witch);
    }
    if enabled.cupid {
        deck.push(Role::Cupid);
    }
    let fillers = participants.saturating_sub(deck.len());
    deck.extend(std::iter::repeat_n(Role::Villager, fillers));
    deck.truncate(participants);
    deck
}

/// Deals roles to `participant_ids`: seats and deck are shuffled
/// independently, then paired by position.
///
/// # Errors
///
/// Returns `DomainError::Validation` if fewer than [`MIN_PARTICIPANTS`]
/// participants are given.
pub fn deal_roles(
    participant_ids: &[Uuid],
    enabled: EnabledRoles,
    rng: &mut dyn DeterministicRng,
) -> Result<Vec<(Uuid, Role)>, DomainError> {
    if participant_ids.len() < MIN_PARTICIPANTS {
        return Err(DomainError::Validation(format!(
            "at least {MIN_PARTICIPANTS} participants are required, {} joined",
            participant_ids.len()
        )));
    }

    let mut seats = participant_ids.to_vec();
    shuffle(rng, &mut seats);
    let mut deck = role_deck(seats.len(), enabled);
    shuffle(rng, &mut deck);

    Ok(seats.into_iter().zip(deck).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightfall_core::rng::SystemRng;
    use nightfall_test_support::MockRng;

    fn count(deck: &[Role], role: Role) -> usize {
        deck.iter().filter(|r| **r == role).count()
    }

    #[test]
    fn test_werewolf_count_follows_ranges() {
        let expected = [
            (5, 1),
            (7, 1),
            (8, 2),
            (11, 2),
            (12, 3),
            (15, 3),
            (16, 4),
            (20, 4),
        ];
        for (participants, wolves) in expected {
            assert_eq!(werewolf_count(participants), wolves, "{participants} participants");
        }
    }

    #[test]
    fn test_werewolf_count_below_smallest_range_defaults_to_one() {
        assert_eq!(werewolf_count(3), 1);
        assert_eq!(werewolf_count(0), 1);
    }

    #[test]
    fn test_role_deck_composition_for_all_documented_sizes() {
        for participants in [5, 7, 8, 11, 12, 15, 16, 20] {
            let deck = role_deck(participants, EnabledRoles::default());

            assert_eq!(deck.len(), participants);
            assert_eq!(count(&deck, Role::Werewolf), werewolf_count(participants));
            assert_eq!(count(&deck, Role::Seer), 1);
            assert_eq!(count(&deck, Role::Witch), 1);
            assert_eq!(count(&deck, Role::Cupid), 1);
            assert_eq!(
                count(&deck, Role::Villager),
                participants - werewolf_count(participants) - 3
            );
        }
    }

    #[test]
    fn test_role_deck_respects_disabled_unique_roles() {
        let enabled = EnabledRoles {
            seer: true,
            witch: false,
            cupid: false,
        };

        let deck = role_deck(8, enabled);

        assert_eq!(count(&deck, Role::Witch), 0);
        assert_eq!(count(&deck, Role::Cupid), 0);
        assert_eq!(count(&deck, Role::Seer), 1);
        assert_eq!(count(&deck, Role::Villager), 5);
    }

    #[test]
    fn test_deal_roles_refuses_below_minimum() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

        let result = deal_roles(&ids, EnabledRoles::default(), &mut MockRng);

        match result {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("at least 5")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_deal_roles_gives_every_participant_exactly_one_role() {
        let ids: Vec<Uuid> = (0..12).map(|_| Uuid::new_v4()).collect();
        let mut rng = SystemRng::seeded(11);

        let dealt = deal_roles(&ids, EnabledRoles::default(), &mut rng).unwrap();

        assert_eq!(dealt.len(), 12);
        for id in &ids {
            assert_eq!(dealt.iter().filter(|(pid, _)| pid == id).count(), 1);
        }
        let roles: Vec<Role> = dealt.iter().map(|(_, r)| *r).collect();
        assert_eq!(count(&roles, Role::Werewolf), 3);
    }
}
