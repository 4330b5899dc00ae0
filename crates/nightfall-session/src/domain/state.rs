//! Session state: phase, counters, narration, and the two submission boxes.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use uuid::Uuid;

use super::commands::{NightAction, NightStep};
use super::outcome::Outcome;

/// Narration lines kept; older lines are dropped first.
pub const NARRATION_CAPACITY: usize = 200;

/// Phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Waiting for participants.
    Lobby,
    /// Night steps are running.
    Night,
    /// Discussion countdown.
    Day,
    /// Vote window.
    Vote,
    /// Pause after a night or vote resolution.
    Result,
    /// Terminal.
    GameOver,
}

/// Bounded, append-only narration log.
#[derive(Debug, Clone, Default)]
pub struct NarrationLog {
    lines: VecDeque<String>,
}

impl NarrationLog {
    /// Appends a line, dropping the oldest one past capacity.
    pub fn push(&mut self, line: String) {
        if self.lines.len() == NARRATION_CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Lines, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &String> {
        self.lines.iter()
    }

    /// Most recent line.
    #[must_use]
    pub fn last(&self) -> Option<&String> {
        self.lines.back()
    }

    /// Number of stored lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing has been narrated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Submissions for the currently open night step.
#[derive(Debug, Default)]
pub struct ActionInbox {
    step: Option<NightStep>,
    deadline: Option<DateTime<Utc>>,
    eligible: Vec<Uuid>,
    received: HashMap<Uuid, NightAction>,
    wake: Arc<Notify>,
}

impl ActionInbox {
    /// Opens a fresh inbox for `step`, discarding anything left over.
    pub fn open(&mut self, step: NightStep, eligible: Vec<Uuid>, deadline: DateTime<Utc>) {
        *self = Self {
            step: Some(step),
            deadline: Some(deadline),
            eligible,
            received: HashMap::new(),
            wake: Arc::new(Notify::new()),
        };
    }

    /// Closes the inbox and hands back what was received.
    pub fn close(&mut self) -> HashMap<Uuid, NightAction> {
        self.step = None;
        self.deadline = None;
        self.eligible.clear();
        std::mem::take(&mut self.received)
    }

    /// The step accepting submissions at `now`, if any.
    #[must_use]
    pub fn active_step(&self, now: DateTime<Utc>) -> Option<NightStep> {
        match (self.step, self.deadline) {
            (Some(step), Some(deadline)) if now <= deadline => Some(step),
            _ => None,
        }
    }

    /// Deadline of the open step.
    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Whether `actor` was asked to act in the open step.
    #[must_use]
    pub fn is_eligible(&self, actor: Uuid) -> bool {
        self.eligible.contains(&actor)
    }

    /// Submissions so far.
    #[must_use]
    pub fn received(&self) -> &HashMap<Uuid, NightAction> {
        &self.received
    }

    /// Signal fired on every accepted submission.
    #[must_use]
    pub fn wake(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    /// Records `action` from `actor` if it targets the open step before its
    /// deadline and `actor` is an eligible, living participant. A repeat
    /// submission replaces the previous one. Returns whether it was kept.
    pub fn accept(
        &mut self,
        actor: Uuid,
        action: NightAction,
        now: DateTime<Utc>,
        actor_alive: bool,
    ) -> bool {
        if self.active_step(now) != Some(action.step()) || !actor_alive || !self.is_eligible(actor)
        {
            return false;
        }
        self.received.insert(actor, action);
        self.wake.notify_one();
        true
    }
}

/// Day votes, voter to target. Last vote counts.
#[derive(Debug, Default)]
pub struct VoteBox {
    deadline: Option<DateTime<Utc>>,
    votes: HashMap<Uuid, Uuid>,
    wake: Arc<Notify>,
}

impl VoteBox {
    /// Opens a fresh, empty box.
    pub fn open(&mut self, deadline: DateTime<Utc>) {
        *self = Self {
            deadline: Some(deadline),
            votes: HashMap::new(),
            wake: Arc::new(Notify::new()),
        };
    }

    /// Deadline of the vote window.
    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Votes cast so far.
    #[must_use]
    pub fn votes(&self) -> &HashMap<Uuid, Uuid> {
        &self.votes
    }

    /// Signal fired on every accepted vote.
    #[must_use]
    pub fn wake(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    /// Records a vote if the box is open at `now`. Liveness of voter and
    /// target is checked by the caller. Returns whether it was kept.
    pub fn accept(&mut self, voter: Uuid, target: Uuid, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) if now <= deadline => {
                self.votes.insert(voter, target);
                self.wake.notify_one();
                true
            }
            _ => false,
        }
    }
}

/// Per-night scratch, cleared at the start of each night.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NightScratch {
    /// The werewolves' pick.
    pub victim: Option<Uuid>,
    /// Whether the witch spent her heal tonight.
    pub healed: bool,
    /// The witch's poison pick.
    pub poison_target: Option<Uuid>,
}

/// Everything about the session except the participants.
#[derive(Debug)]
pub struct SessionState {
    /// Current phase.
    pub phase: Phase,
    /// Nights begun so far.
    pub night_count: u32,
    /// Days begun so far.
    pub day_count: u32,
    /// Narration log.
    pub narration: NarrationLog,
    /// Whether roles have been dealt.
    pub started: bool,
    /// Terminal outcome, once decided.
    pub outcome: Option<Outcome>,
    /// Tonight's scratch.
    pub night: NightScratch,
    /// Night-step submissions.
    pub inbox: ActionInbox,
    /// Day votes.
    pub vote_box: VoteBox,
    /// End of the running timed phase; remaining seconds are derived from it.
    pub phase_ends_at: Option<DateTime<Utc>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Lobby,
            night_count: 0,
            day_count: 0,
            narration: NarrationLog::default(),
            started: false,
            outcome: None,
            night: NightScratch::default(),
            inbox: ActionInbox::default(),
            vote_box: VoteBox::default(),
            phase_ends_at: None,
        }
    }
}
