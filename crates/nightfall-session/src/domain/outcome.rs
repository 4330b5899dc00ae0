//! Win evaluation.

use serde::{Deserialize, Serialize};

use super::participant::Participant;
use super::roles::Role;

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every werewolf is dead.
    Villagers,
    /// Werewolves are at least as many as everyone else alive.
    Werewolves,
    /// Nobody is left alive.
    Nobody,
}

impl Outcome {
    /// Human-readable winner label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Villagers => "the Villagers",
            Self::Werewolves => "the Werewolves",
            Self::Nobody => "Nobody",
        }
    }
}

/// Decides whether the game is over. Always `None` before the game starts.
#[must_use]
pub fn evaluate(participants: &[Participant], started: bool) -> Option<Outcome> {
    if !started {
        return None;
    }
    let (wolves, others) = participants
        .iter()
        .filter(|p| p.is_alive())
        .fold((0_usize, 0_usize), |(w, o), p| {
            if p.has_role(Role::Werewolf) {
                (w + 1, o)
            } else {
                (w, o + 1)
            }
        });

    if wolves + others == 0 {
        Some(Outcome::Nobody)
    } else if wolves == 0 {
        Some(Outcome::Villagers)
    } else if wolves >= others {
        Some(Outcome::Werewolves)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn table(roles: &[Role]) -> Vec<Participant> {
        roles
            .iter()
            .enumerate()
            .map(|(i, role)| {
                let mut p = Participant::new(Uuid::new_v4(), format!("P{}", i + 1));
                p.role = Some(*role);
                p
            })
            .collect()
    }

    fn five() -> Vec<Participant> {
        table(&[
            Role::Werewolf,
            Role::Seer,
            Role::Witch,
            Role::Cupid,
            Role::Villager,
        ])
    }

    #[test]
    fn test_no_outcome_before_start() {
        let mut players = five();
        for p in &mut players {
            p.alive = false;
        }

        assert_eq!(evaluate(&players, false), None);
    }

    #[test]
    fn test_villagers_win_when_all_werewolves_dead() {
        let mut players = five();
        players[0].alive = false;

        assert_eq!(evaluate(&players, true), Some(Outcome::Villagers));
    }

    #[test]
    fn test_werewolves_win_at_parity() {
        let mut players = five();
        for p in &mut players[1..4] {
            p.alive = false;
        }

        assert_eq!(evaluate(&players, true), Some(Outcome::Werewolves));
    }

    #[test]
    fn test_werewolves_win_when_outnumbering() {
        let mut players = table(&[
            Role::Werewolf,
            Role::Werewolf,
            Role::Villager,
            Role::Villager,
            Role::Seer,
        ]);
        players[2].alive = false;
        players[3].alive = false;

        assert_eq!(evaluate(&players, true), Some(Outcome::Werewolves));
    }

    #[test]
    fn test_nobody_wins_when_everyone_dead() {
        let mut players = five();
        for p in &mut players {
            p.alive = false;
        }

        assert_eq!(evaluate(&players, true), Some(Outcome::Nobody));
    }

    #[test]
    fn test_game_continues_with_one_wolf_and_two_others() {
        let mut players = five();
        players[1].alive = false;
        players[2].alive = false;

        assert_eq!(evaluate(&players, true), None);
    }

    #[test]
    fn test_fresh_five_player_game_continues() {
        assert_eq!(evaluate(&five(), true), None);
    }
}
