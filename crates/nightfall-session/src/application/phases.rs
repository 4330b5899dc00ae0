//! The phase loop: night, discussion, vote, repeat until someone wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use super::collector::TICK;
use super::query_handlers::reveal_card;
use super::session::Session;
use crate::domain::events::ServerEvent;
use crate::domain::resolution::resolve_vote;
use crate::domain::roles::Role;
use crate::domain::state::Phase;
use crate::domain::views::TallyEntry;

fn after(now: DateTime<Utc>, length: Duration) -> DateTime<Utc> {
    now + TimeDelta::from_std(length).unwrap_or_default()
}

impl Session {
    /// Drives the game until it is decided. Checks for a winner at the top
    /// of every round, after the night and after the vote.
    pub(crate) async fn run(self: Arc<Self>) {
        loop {
            if self.finish_if_decided().await {
                return;
            }
            self.night().await;
            if self.finish_if_decided().await {
                return;
            }
            self.day().await;
            self.vote().await;
            if self.finish_if_decided().await {
                return;
            }
        }
    }

    async fn day(&self) {
        let (day, discussion) = {
            let mut table = self.table.lock().await;
            let state = &mut table.village.state;
            state.phase = Phase::Day;
            state.day_count += 1;
            (state.day_count, table.config.discussion)
        };
        info!(day, "day breaks");
        self.narrate(&format!("Day {day}. Discuss.")).await;
        self.countdown(discussion, Phase::Day, "Discussion").await;
    }

    /// Ticks a public countdown every second while `phase` lasts.
    async fn countdown(&self, length: Duration, phase: Phase, label: &str) {
        let end = after(self.clock.now(), length);
        loop {
            let seconds_left = {
                let mut table = self.table.lock().await;
                let state = &mut table.village.state;
                if state.phase != phase {
                    if state.phase_ends_at == Some(end) {
                        state.phase_ends_at = None;
                    }
                    return;
                }
                state.phase_ends_at = Some(end);
                self.clock.seconds_until(end)
            };
            self.broadcast(&ServerEvent::Countdown {
                label: label.to_owned(),
                seconds_left,
            })
            .await;
            self.sync_all().await;
            if seconds_left == 0 {
                break;
            }
            let left = (end - self.clock.now()).to_std().unwrap_or_default();
            tokio::time::sleep(left.min(TICK)).await;
        }
        self.table.lock().await.village.state.phase_ends_at = None;
    }

    async fn vote(&self) {
        let (deadline, wake, seconds) = {
            let mut table = self.table.lock().await;
            let window = table.config.vote;
            let deadline = after(self.clock.now(), window);
            let state = &mut table.village.state;
            state.phase = Phase::Vote;
            state.vote_box.open(deadline);
            state.phase_ends_at = Some(deadline);
            (deadline, state.vote_box.wake(), window.as_secs())
        };
        info!(%deadline, "vote opened");
        self.narrate(&format!("The vote begins ({seconds}s).")).await;
        self.broadcast(&ServerEvent::VoteStarted { seconds }).await;
        self.sync_all().await;

        loop {
            let (received, total, seconds_left) = {
                let table = self.table.lock().await;
                let village = &table.village;
                let alive = village.alive_ids();
                let votes = village.state.vote_box.votes();
                let received = alive.iter().filter(|id| votes.contains_key(id)).count();
                (received, alive.len(), self.clock.seconds_until(deadline))
            };
            self.broadcast(&ServerEvent::VoteStatus {
                received,
                total,
                seconds_left,
            })
            .await;
            self.sync_all().await;

            let everyone_voted = total > 0 && received == total;
            if everyone_voted || self.clock.now() >= deadline {
                break;
            }
            self.nap(&wake, deadline).await;
        }

        self.narrate("The vote is closed. Counting...").await;
        self.announce_vote().await;
    }

    async fn announce_vote(&self) {
        let (tally, eliminated, pause) = {
            let mut table = self.table.lock().await;
            let table = &mut *table;
            let report = resolve_vote(&mut table.village, table.rng.as_mut());
            let village = &mut table.village;
            village.state.phase = Phase::Result;
            village.state.phase_ends_at = None;

            let tally: Vec<TallyEntry> = report
                .tally
                .iter()
                .map(|(id, votes)| TallyEntry {
                    id: *id,
                    name: village.name_of(*id),
                    votes: *votes,
                })
                .collect();
            let eliminated = report
                .eliminated
                .and_then(|id| village.participant(id))
                .map(reveal_card);
            (tally, eliminated, table.config.result_pause)
        };
        info!(eliminated = ?eliminated.as_ref().map(|p| p.id), "vote resolved");

        let line = eliminated.as_ref().map_or_else(
            || "Nobody was eliminated.".to_owned(),
            |p| {
                format!(
                    "The village has decided: {} is eliminated. ({})",
                    p.name,
                    p.role.map_or("-", Role::label)
                )
            },
        );
        self.broadcast(&ServerEvent::VoteResult { tally, eliminated })
            .await;
        self.narrate(&line).await;
        self.sync_all().await;
        tokio::time::sleep(pause).await;
    }

    /// Ends the game if the win evaluator has a verdict. Returns whether it
    /// did.
    async fn finish_if_decided(&self) -> bool {
        let winner = {
            let mut table = self.table.lock().await;
            let Some(winner) = table.village.outcome() else {
                return false;
            };
            let state = &mut table.village.state;
            state.phase = Phase::GameOver;
            state.outcome = Some(winner);
            state.phase_ends_at = None;
            winner
        };
        info!(?winner, "game over");
        self.narrate(&format!("Game over! Victory: {}.", winner.label()))
            .await;
        self.broadcast(&ServerEvent::GameOver {
            winner,
            winner_label: winner.label(),
        })
        .await;
        self.sync_all().await;
        true
    }
}
