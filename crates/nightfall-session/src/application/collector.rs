//! Timed action collection.
//!
//! A step opens a fresh inbox for its eligible actors, asks each living one
//! to act, then re-checks completion on every submission and at least once a
//! second until everyone alive has answered, the werewolves agree, or the
//! deadline passes.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Notify;
use tracing::{debug, info};
use uuid::Uuid;

use super::session::Session;
use crate::domain::commands::{NightAction, NightStep};
use crate::domain::events::{ActionPrompt, ServerEvent};
use crate::domain::resolution::wolves_unanimous;

/// Longest wait between two completion checks.
pub const TICK: Duration = Duration::from_secs(1);

/// A request for input from one night step's actors.
#[derive(Debug, Clone)]
pub struct StepRequest {
    pub step: NightStep,
    pub actors: Vec<Uuid>,
    pub timeout: Duration,
}

/// Why a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every living actor answered.
    AllResponded,
    /// Every living werewolf picked the same valid target.
    Unanimous,
    /// Time ran out.
    Deadline,
}

impl Session {
    /// Runs one step to completion and returns what was submitted.
    pub(crate) async fn collect(
        &self,
        request: StepRequest,
    ) -> (Completion, HashMap<Uuid, NightAction>) {
        let StepRequest {
            step,
            actors,
            timeout,
        } = request;

        let (deadline, wake, reachable) = {
            let mut table = self.table.lock().await;
            let deadline = self.clock.now() + TimeDelta::from_std(timeout).unwrap_or_default();
            let village = &mut table.village;
            let reachable: Vec<Uuid> = actors
                .iter()
                .copied()
                .filter(|id| village.is_alive(*id))
                .collect();
            village.state.inbox.open(step, actors.clone(), deadline);
            village.state.phase_ends_at = Some(deadline);
            (deadline, village.state.inbox.wake(), reachable)
        };
        info!(?step, actors = reachable.len(), %deadline, "step opened");

        let request = ServerEvent::ActionRequest {
            step,
            deadline,
            payload: ActionPrompt {
                action: step.prompt(),
            },
        };
        for actor in reachable {
            self.send_private(actor, &request).await;
        }

        let mut announced_unanimity = false;
        let completion = loop {
            let verdict = {
                let table = self.table.lock().await;
                let village = &table.village;
                let received = village.state.inbox.received();
                let unanimous =
                    step == NightStep::Wolves && wolves_unanimous(village, received, &actors);
                let all_in = step != NightStep::Wolves
                    && actors
                        .iter()
                        .filter(|id| village.is_alive(**id))
                        .all(|id| received.contains_key(id));

                if unanimous {
                    Some(Completion::Unanimous)
                } else if all_in {
                    Some(Completion::AllResponded)
                } else if self.clock.now() >= deadline {
                    Some(Completion::Deadline)
                } else {
                    None
                }
            };

            self.sync_all().await;
            if verdict == Some(Completion::Unanimous) && !announced_unanimity {
                announced_unanimity = true;
                self.narrate("The werewolves are unanimous.").await;
            }
            if let Some(done) = verdict {
                break done;
            }
            self.nap(&wake, deadline).await;
        };

        let received = {
            let mut table = self.table.lock().await;
            table.village.state.phase_ends_at = None;
            table.village.state.inbox.close()
        };
        debug!(?step, ?completion, responses = received.len(), "step closed");
        (completion, received)
    }

    /// Sleeps until the next tick, the deadline, or a submission wake-up,
    /// whichever comes first.
    pub(crate) async fn nap(&self, wake: &Notify, deadline: DateTime<Utc>) {
        let left = (deadline - self.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO)
            .min(TICK);
        tokio::select! {
            () = wake.notified() => {}
            () = tokio::time::sleep(left) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use nightfall_core::delivery::Audience;
    use nightfall_test_support::{MockRng, RecordingDelivery, TokioClock};

    use super::*;
    use crate::domain::config::EnabledRoles;
    use crate::domain::roles::Role;

    /// Session with five started participants: wolf, seer, witch, cupid,
    /// villager. No runner is spawned; tests drive steps directly.
    async fn table() -> (Arc<Session>, Arc<RecordingDelivery>, [Uuid; 5]) {
        let delivery = Arc::new(RecordingDelivery::new());
        let clock = TokioClock::new(Utc.with_ymd_and_hms(2026, 1, 15, 22, 0, 0).unwrap());
        let session = Arc::new(Session::new(
            Arc::new(clock),
            Box::new(MockRng),
            delivery.clone(),
        ));
        let mut ids = [Uuid::nil(); 5];
        for (i, slot) in ids.iter_mut().enumerate() {
            *slot = session.join(&format!("P{}", i + 1)).await.unwrap();
        }
        {
            let mut table = session.table.lock().await;
            table
                .village
                .begin(EnabledRoles::default(), &mut MockRng)
                .unwrap();
            let roles = [
                Role::Werewolf,
                Role::Seer,
                Role::Witch,
                Role::Cupid,
                Role::Villager,
            ];
            for (id, role) in ids.iter().zip(roles) {
                table.village.participant_mut(*id).unwrap().role = Some(role);
            }
        }
        (session, delivery, ids)
    }

    fn request(step: NightStep, actors: Vec<Uuid>) -> StepRequest {
        StepRequest {
            step,
            actors,
            timeout: Duration::from_secs(20),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_ends_at_deadline_without_submissions() {
        // Arrange
        let (session, _, [_, seer, ..]) = table().await;
        let started = tokio::time::Instant::now();

        // Act
        let (completion, received) = session.collect(request(NightStep::Seer, vec![seer])).await;

        // Assert
        assert_eq!(completion, Completion::Deadline);
        assert!(received.is_empty());
        assert_eq!(started.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_ends_early_once_the_actor_answers() {
        // Arrange
        let (session, delivery, [wolf, seer, ..]) = table().await;
        let screen = delivery.register(Audience::Participant(seer));
        let started = tokio::time::Instant::now();
        let submitter = Arc::clone(&session);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            submitter
                .submit_action(seer, NightAction::Reveal { target: Some(wolf) })
                .await;
        });

        // Act
        let (completion, received) = session.collect(request(NightStep::Seer, vec![seer])).await;

        // Assert
        assert_eq!(completion, Completion::AllResponded);
        assert_eq!(started.elapsed(), Duration::from_millis(2500));
        assert_eq!(received[&seer], NightAction::Reveal { target: Some(wolf) });
        let asks = delivery.messages_of_type(screen, "ACTION_REQUEST");
        assert_eq!(asks.len(), 1);
        assert_eq!(asks[0]["payload"]["action"], "seer_pick_one");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wolves_step_ends_on_unanimity_and_announces_once() {
        // Arrange
        let (session, delivery, [wolf, seer, _, _, villager]) = table().await;
        session
            .table
            .lock()
            .await
            .village
            .participant_mut(seer)
            .unwrap()
            .role = Some(Role::Werewolf);
        let tv = delivery.register(Audience::Shared);
        let submitter = Arc::clone(&session);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            for wolf_id in [wolf, seer] {
                submitter
                    .submit_action(
                        wolf_id,
                        NightAction::Hunt {
                            target: Some(villager),
                        },
                    )
                    .await;
            }
        });

        // Act
        let (completion, received) = session
            .collect(request(NightStep::Wolves, vec![wolf, seer]))
            .await;

        // Assert
        assert_eq!(completion, Completion::Unanimous);
        assert_eq!(received.len(), 2);
        let announcements: Vec<_> = delivery
            .messages_of_type(tv, "NARRATOR_LINE")
            .into_iter()
            .filter(|m| m["line"].as_str().unwrap().ends_with("The werewolves are unanimous."))
            .collect();
        assert_eq!(announcements.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_wolf_answer_does_not_end_a_split_pack() {
        let (session, _, [wolf, seer, witch, _, villager]) = table().await;
        session
            .table
            .lock()
            .await
            .village
            .participant_mut(seer)
            .unwrap()
            .role = Some(Role::Werewolf);
        let submitter = Arc::clone(&session);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            submitter
                .submit_action(wolf, NightAction::Hunt { target: Some(villager) })
                .await;
            submitter
                .submit_action(seer, NightAction::Hunt { target: Some(witch) })
                .await;
        });

        let (completion, received) = session
            .collect(request(NightStep::Wolves, vec![wolf, seer]))
            .await;

        assert_eq!(completion, Completion::Deadline);
        assert_eq!(received.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revote_into_agreement_announces_unanimity_once_and_closes_the_step() {
        // Arrange
        let (session, delivery, [wolf, seer, witch, _, villager]) = table().await;
        session
            .table
            .lock()
            .await
            .village
            .participant_mut(seer)
            .unwrap()
            .role = Some(Role::Werewolf);
        let tv = delivery.register(Audience::Shared);
        let started = tokio::time::Instant::now();
        let submitter = Arc::clone(&session);
        let late_revote = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            submitter
                .submit_action(wolf, NightAction::Hunt { target: Some(villager) })
                .await;
            submitter
                .submit_action(seer, NightAction::Hunt { target: Some(witch) })
                .await;
            tokio::time::sleep(Duration::from_millis(2500)).await;
            submitter
                .submit_action(seer, NightAction::Hunt { target: Some(villager) })
                .await;
            tokio::time::sleep(Duration::from_secs(1)).await;
            submitter
                .submit_action(wolf, NightAction::Hunt { target: Some(witch) })
                .await
        });

        // Act
        let (completion, received) = session
            .collect(request(NightStep::Wolves, vec![wolf, seer]))
            .await;

        // Assert
        assert_eq!(completion, Completion::Unanimous);
        assert_eq!(started.elapsed(), Duration::from_millis(3500));
        assert_eq!(received[&wolf].hunt_target(), Some(villager));
        assert_eq!(received[&seer].hunt_target(), Some(villager));
        assert!(!late_revote.await.unwrap());
        let announcements = delivery
            .messages_of_type(tv, "NARRATOR_LINE")
            .into_iter()
            .filter(|m| m["line"].as_str().unwrap().ends_with("The werewolves are unanimous."))
            .count();
        assert_eq!(announcements, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_actor_does_not_block_completion() {
        let (session, _, [_, seer, ..]) = table().await;
        session.table.lock().await.village.kill(&[seer]);

        let (completion, _) = session.collect(request(NightStep::Seer, vec![seer])).await;

        assert_eq!(completion, Completion::AllResponded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_submission_is_ignored_after_close() {
        let (session, _, [wolf, seer, ..]) = table().await;
        session.collect(request(NightStep::Seer, vec![seer])).await;

        let accepted = session
            .submit_action(seer, NightAction::Reveal { target: Some(wolf) })
            .await;

        assert!(!accepted);
        assert!(session.table.lock().await.village.state.inbox.received().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_for_another_step_is_ignored() {
        let (session, _, [wolf, seer, ..]) = table().await;
        let submitter = Arc::clone(&session);
        let probe = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            submitter
                .submit_action(seer, NightAction::Hunt { target: Some(wolf) })
                .await
        });

        let (completion, received) = session.collect(request(NightStep::Seer, vec![seer])).await;

        assert!(!probe.await.unwrap());
        assert_eq!(completion, Completion::Deadline);
        assert!(received.is_empty());
    }
}
