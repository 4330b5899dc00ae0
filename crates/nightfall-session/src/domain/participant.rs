//! Participants.

use uuid::Uuid;

use super::roles::Role;

/// Longest display name kept on join.
pub const MAX_NAME_LEN: usize = 24;

/// One person in the session.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Opaque identifier handed out on join.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    pub(crate) alive: bool,
    pub(crate) role: Option<Role>,
    pub(crate) partner: Option<Uuid>,
    pub(crate) heal_used: bool,
    pub(crate) poison_used: bool,
}

impl Participant {
    /// Creates a freshly joined participant: alive, no role, no partner.
    #[must_use]
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            alive: true,
            role: None,
            partner: None,
            heal_used: false,
            poison_used: false,
        }
    }

    /// Whether the participant is still in the game.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// The dealt role, `None` before the game starts.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Whether the participant holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }

    /// The lover paired with this participant, if any.
    #[must_use]
    pub fn partner(&self) -> Option<Uuid> {
        self.partner
    }

    /// Whether the witch's heal potion is spent.
    #[must_use]
    pub fn heal_used(&self) -> bool {
        self.heal_used
    }

    /// Whether the witch's poison potion is spent.
    #[must_use]
    pub fn poison_used(&self) -> bool {
        self.poison_used
    }

    /// Spends the heal potion. Returns `false` if it was already spent.
    pub(crate) fn spend_heal(&mut self) -> bool {
        !std::mem::replace(&mut self.heal_used, true)
    }

    /// Spends the poison potion. Returns `false` if it was already spent.
    pub(crate) fn spend_poison(&mut self) -> bool {
        !std::mem::replace(&mut self.poison_used, true)
    }
}

/// Cleans a requested display name: trimmed, at most [`MAX_NAME_LEN`]
/// characters, and a generated fallback when nothing is left.
#[must_use]
pub fn display_name(requested: &str, id: Uuid) -> String {
    let trimmed: String = requested.trim().chars().take(MAX_NAME_LEN).collect();
    let trimmed = trimmed.trim_end();
    if trimmed.is_empty() {
        let simple = id.simple().to_string();
        format!("Player-{}", &simple[..8])
    } else {
        trimmed.to_owned()
    }
}
