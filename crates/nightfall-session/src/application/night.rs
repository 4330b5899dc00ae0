//! The night: cupid (first night only), werewolves, seer, witch, then
//! resolution.

use std::collections::HashMap;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use super::collector::StepRequest;
use super::session::Session;
use crate::domain::commands::{NightAction, NightStep};
use crate::domain::events::ServerEvent;
use crate::domain::resolution::{
    WolvesVerdict, apply_brew, apply_pairing, resolve_night, resolve_wolves, reveal,
};
use crate::domain::roles::Role;
use crate::domain::state::{NightScratch, Phase};

/// Pause after the dawn announcement.
pub const DAWN_PAUSE: Duration = Duration::from_millis(800);

fn opening_line(step: NightStep) -> &'static str {
    match step {
        NightStep::Cupid => "Cupid, choose two lovers.",
        NightStep::Wolves => "Werewolves, choose your victim.",
        NightStep::Seer => "Seer, choose someone to unmask.",
        NightStep::Witch => "Witch, use your potions if you wish.",
    }
}

fn closing_line(step: NightStep) -> &'static str {
    match step {
        NightStep::Cupid => "Cupid closes their eyes.",
        NightStep::Wolves => "The werewolves close their eyes.",
        NightStep::Seer => "The seer closes their eyes.",
        NightStep::Witch => "The witch closes their eyes.",
    }
}

impl Session {
    pub(crate) async fn night(&self) {
        let night = {
            let mut table = self.table.lock().await;
            let state = &mut table.village.state;
            state.phase = Phase::Night;
            state.night_count += 1;
            state.night = NightScratch::default();
            state.night_count
        };
        info!(night, "night falls");
        self.narrate(&format!("Night {night}. The village falls asleep."))
            .await;
        self.sync_all().await;

        if night == 1 {
            self.cupid_step().await;
        }
        self.wolves_step().await;
        self.seer_step().await;
        self.witch_step().await;
        self.dawn().await;
    }

    /// Living holders of the role acting in `step`, with the step window.
    async fn actors(&self, step: NightStep) -> (Vec<Uuid>, Duration) {
        let table = self.table.lock().await;
        (
            table.village.alive_with_role(step.actor_role()),
            table.config.night_step,
        )
    }

    /// Opens `step` for its actors and returns their submissions, or `None`
    /// when no actor is alive.
    async fn run_step(
        &self,
        step: NightStep,
    ) -> Option<(Vec<Uuid>, HashMap<Uuid, NightAction>)> {
        let (actors, timeout) = self.actors(step).await;
        if actors.is_empty() {
            return None;
        }
        self.narrate(opening_line(step)).await;
        let (_, received) = self
            .collect(StepRequest {
                step,
                actors: actors.clone(),
                timeout,
            })
            .await;
        Some((actors, received))
    }

    async fn end_step(&self, step: NightStep) {
        self.narrate(closing_line(step)).await;
        self.sync_all().await;
    }

    async fn cupid_step(&self) {
        let Some((actors, received)) = self.run_step(NightStep::Cupid).await else {
            return;
        };
        let couple = {
            let mut table = self.table.lock().await;
            actors
                .first()
                .and_then(|cupid| received.get(cupid))
                .and_then(|action| apply_pairing(&mut table.village, action))
                .map(|(a, b)| (a, b, table.village.name_of(a), table.village.name_of(b)))
        };

        if let Some((a, b, a_name, b_name)) = couple {
            info!(%a, %b, "lovers paired");
            self.send_private(
                a,
                &ServerEvent::LoverAssigned {
                    lover_id: b,
                    lover_name: b_name,
                },
            )
            .await;
            self.send_private(
                b,
                &ServerEvent::LoverAssigned {
                    lover_id: a,
                    lover_name: a_name,
                },
            )
            .await;
        }
        self.end_step(NightStep::Cupid).await;
    }

    async fn wolves_step(&self) {
        let Some((hunters, received)) = self.run_step(NightStep::Wolves).await else {
            return;
        };
        let verdict = {
            let mut table = self.table.lock().await;
            let table = &mut *table;
            let verdict = resolve_wolves(&table.village, &received, &hunters, table.rng.as_mut());
            table.village.state.night.victim = verdict.victim();
            verdict
        };
        info!(?verdict, "werewolves decided");

        if matches!(verdict, WolvesVerdict::Starved(_)) {
            self.narrate("The werewolves could not agree... hunger decides for them!")
                .await;
        }
        self.end_step(NightStep::Wolves).await;
    }

    async fn seer_step(&self) {
        let Some((actors, received)) = self.run_step(NightStep::Seer).await else {
            return;
        };
        let answer = {
            let table = self.table.lock().await;
            actors.first().and_then(|seer| {
                let (target, role) = reveal(&table.village, received.get(seer)?)?;
                Some((*seer, target, table.village.name_of(target), role))
            })
        };

        if let Some((seer, target_id, target_name, role)) = answer {
            let event = ServerEvent::SeerResult {
                target_id,
                target_name,
                role,
                role_label: role.map(Role::label),
            };
            self.send_private(seer, &event).await;
        }
        self.end_step(NightStep::Seer).await;
    }

    async fn witch_step(&self) {
        let briefing = {
            let table = self.table.lock().await;
            let village = &table.village;
            let witch = village.alive_with_role(Role::Witch).first().copied();
            witch.zip(village.state.night.victim).and_then(|(witch, victim)| {
                let brewer = village.participant(witch)?;
                Some((
                    witch,
                    ServerEvent::WitchContext {
                        wolves_victim_id: victim,
                        wolves_victim_name: village.name_of(victim),
                        heal_used: brewer.heal_used(),
                        poison_used: brewer.poison_used(),
                    },
                ))
            })
        };
        if let Some((witch, context)) = briefing {
            self.send_private(witch, &context).await;
        }

        let Some((actors, received)) = self.run_step(NightStep::Witch).await else {
            return;
        };
        {
            let mut table = self.table.lock().await;
            if let Some((witch, action)) = actors
                .first()
                .and_then(|witch| received.get(witch).map(|action| (*witch, action)))
            {
                apply_brew(&mut table.village, witch, action);
            }
        }
        self.end_step(NightStep::Witch).await;
    }

    /// Resolves the night and announces every death.
    async fn dawn(&self) {
        let lines = {
            let mut table = self.table.lock().await;
            let village = &mut table.village;
            let report = resolve_night(village);
            village.state.phase = Phase::Result;
            info!(deaths = report.deaths().len(), "night resolved");

            let role_of = |id| {
                village
                    .participant(id)
                    .and_then(|p| p.role())
                    .map_or("-", Role::label)
            };
            if report.is_peaceful() {
                vec!["Dawn breaks... nobody died tonight!".to_owned()]
            } else {
                let direct = report.direct.iter().map(|id| {
                    format!(
                        "Dawn breaks... {} is dead. ({})",
                        village.name_of(*id),
                        role_of(*id)
                    )
                });
                let heartbreak = report.heartbreak.iter().map(|(lover, cause)| {
                    format!(
                        "{} dies of heartbreak, in love with {}. ({})",
                        village.name_of(*lover),
                        village.name_of(*cause),
                        role_of(*lover)
                    )
                });
                direct.chain(heartbreak).collect()
            }
        };

        for line in lines {
            self.narrate(&line).await;
        }
        self.sync_all().await;
        tokio::time::sleep(DAWN_PAUSE).await;
    }
}
