//! The aggregate root for one live session.

use chrono::{DateTime, Utc};
use nightfall_core::error::DomainError;
use nightfall_core::rng::DeterministicRng;
use uuid::Uuid;

use super::config::EnabledRoles;
use super::outcome::{self, Outcome};
use super::participant::{Participant, display_name};
use super::roles::{Role, deal_roles};
use super::state::{Phase, SessionState};

/// Everyone who joined, in join order, plus the shared session state.
#[derive(Debug, Default)]
pub struct Village {
    pub(crate) participants: Vec<Participant>,
    /// Phase, counters, narration and the submission boxes.
    pub state: SessionState,
}

impl Village {
    /// Creates an empty lobby.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All participants in join order.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    #[must_use]
    pub fn participant(&self, id: Uuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub(crate) fn participant_mut(&mut self, id: Uuid) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    /// Display name of `id`, or `"?"` for an unknown identifier.
    #[must_use]
    pub fn name_of(&self, id: Uuid) -> String {
        self.participant(id)
            .map_or_else(|| "?".to_owned(), |p| p.name.clone())
    }

    #[must_use]
    pub fn is_alive(&self, id: Uuid) -> bool {
        self.participant(id).is_some_and(Participant::is_alive)
    }

    #[must_use]
    pub fn alive_ids(&self) -> Vec<Uuid> {
        self.participants
            .iter()
            .filter(|p| p.is_alive())
            .map(|p| p.id)
            .collect()
    }

    /// Alive holders of `role`, in join order.
    #[must_use]
    pub fn alive_with_role(&self, role: Role) -> Vec<Uuid> {
        self.participants
            .iter()
            .filter(|p| p.is_alive() && p.has_role(role))
            .map(|p| p.id)
            .collect()
    }

    /// Adds a participant to the lobby and returns it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` once the game has started.
    pub fn add_participant(
        &mut self,
        id: Uuid,
        requested_name: &str,
    ) -> Result<&Participant, DomainError> {
        if self.state.started {
            return Err(DomainError::Validation(
                "the game has already started".to_owned(),
            ));
        }
        let index = self.participants.len();
        self.participants
            .push(Participant::new(id, display_name(requested_name, id)));
        Ok(&self.participants[index])
    }

    /// Deals roles and marks the session started. Everyone is revived and
    /// all pairings and potions are cleared.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the game already started or too
    /// few participants joined. The village is left untouched.
    pub fn begin(
        &mut self,
        enabled: EnabledRoles,
        rng: &mut dyn DeterministicRng,
    ) -> Result<(), DomainError> {
        if self.state.started {
            return Err(DomainError::Validation(
                "the game has already started".to_owned(),
            ));
        }
        let ids: Vec<Uuid> = self.participants.iter().map(|p| p.id).collect();
        let dealt = deal_roles(&ids, enabled, rng)?;

        for (id, role) in dealt {
            if let Some(p) = self.participant_mut(id) {
                *p = Participant::new(p.id, std::mem::take(&mut p.name));
                p.role = Some(role);
            }
        }
        self.state.started = true;
        self.state.outcome = None;
        self.state.phase = Phase::Night;
        Ok(())
    }

    /// Links two distinct, alive participants to each other. Returns whether
    /// the pairing happened.
    pub fn pair(&mut self, a: Uuid, b: Uuid) -> bool {
        if a == b || !self.is_alive(a) || !self.is_alive(b) {
            return false;
        }
        for (me, partner) in [(a, b), (b, a)] {
            if let Some(p) = self.participant_mut(me) {
                p.partner = Some(partner);
            }
        }
        true
    }

    /// Marks every listed participant dead.
    pub fn kill(&mut self, ids: &[Uuid]) {
        for p in &mut self.participants {
            if ids.contains(&p.id) {
                p.alive = false;
            }
        }
    }

    /// Current terminal outcome, if the game is decided.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        outcome::evaluate(&self.participants, self.state.started)
    }

    /// Appends a time-stamped line to the narration log and returns it.
    pub fn narrate(&mut self, text: &str, now: DateTime<Utc>) -> String {
        let line = format!("[{}] {text}", now.format("%H:%M:%S"));
        self.state.narration.push(line.clone());
        line
    }
}
