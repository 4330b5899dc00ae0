//! The live session object.
//!
//! All game state sits behind one async mutex. The phase loop runs as a
//! spawned task that takes the lock for each mutation and releases it before
//! talking to viewers, so submissions are never blocked by slow delivery.

use std::sync::Arc;

use nightfall_core::clock::Clock;
use nightfall_core::delivery::{Audience, MessageDelivery, Viewer};
use nightfall_core::error::DomainError;
use nightfall_core::event::DomainEvent;
use nightfall_core::rng::DeterministicRng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::query_handlers::{project_private, project_public};
use crate::domain::aggregates::Village;
use crate::domain::commands::NightAction;
use crate::domain::config::{ConfigurePatch, SessionConfig};
use crate::domain::events::ServerEvent;
use crate::domain::state::Phase;
use crate::domain::views::{PrivateView, PublicView};

/// Everything guarded by the session lock.
pub(crate) struct Table {
    pub(crate) village: Village,
    pub(crate) config: SessionConfig,
    pub(crate) rng: Box<dyn DeterministicRng>,
}

/// One live game with its viewers.
pub struct Session {
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) delivery: Arc<dyn MessageDelivery>,
    pub(crate) table: Mutex<Table>,
    runner: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Creates an empty lobby with the default configuration.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        rng: Box<dyn DeterministicRng>,
        delivery: Arc<dyn MessageDelivery>,
    ) -> Self {
        Self {
            clock,
            delivery,
            table: Mutex::new(Table {
                village: Village::new(),
                config: SessionConfig::default(),
                rng,
            }),
            runner: Mutex::new(None),
        }
    }

    /// Adds a participant to the lobby and returns their identifier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` once the game has started.
    pub async fn join(&self, name: &str) -> Result<Uuid, DomainError> {
        let id = Uuid::new_v4();
        let display_name = {
            let mut table = self.table.lock().await;
            table.village.add_participant(id, name)?.name.clone()
        };
        info!(participant_id = %id, name = %display_name, "participant joined");
        self.narrate(&format!("{display_name} joined the village.")).await;
        self.sync_all().await;
        Ok(id)
    }

    /// Deals roles and spawns the phase loop.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the game already started or fewer
    /// than five participants joined.
    pub async fn start(self: &Arc<Self>) -> Result<(), DomainError> {
        let mut runner = self.runner.lock().await;
        {
            let mut table = self.table.lock().await;
            let Table {
                village,
                config,
                rng,
            } = &mut *table;
            village.begin(config.roles, rng.as_mut())?;
            info!(
                participants = village.participants().len(),
                "game started"
            );
        }
        self.narrate("The game begins. Roles have been dealt.").await;
        self.sync_all().await;

        *runner = Some(tokio::spawn(Arc::clone(self).run()));
        Ok(())
    }

    /// Stops the phase loop and wipes participants and state. The
    /// configuration is kept.
    pub async fn reset(&self) {
        let mut runner = self.runner.lock().await;
        if let Some(handle) = runner.take() {
            handle.abort();
            // Wait for the task to stop so it cannot touch the fresh lobby.
            let _ = handle.await;
        }
        self.table.lock().await.village = Village::new();
        drop(runner);

        info!("session reset");
        self.broadcast(&ServerEvent::Reset).await;
        self.sync_all().await;
    }

    /// Applies a partial configuration update.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` once the game has started.
    pub async fn configure(&self, patch: &ConfigurePatch) -> Result<(), DomainError> {
        let mut table = self.table.lock().await;
        if table.village.state.started {
            return Err(DomainError::Validation(
                "configuration is locked once the game has started".to_owned(),
            ));
        }
        table.config.apply(patch);
        debug!(config = ?table.config, "configuration updated");
        Ok(())
    }

    /// Records a night-step submission. Returns whether it was accepted;
    /// stale or ineligible submissions are dropped.
    pub async fn submit_action(&self, participant_id: Uuid, action: NightAction) -> bool {
        let step = action.step();
        let mut table = self.table.lock().await;
        let alive = table.village.is_alive(participant_id);
        let accepted =
            table
                .village
                .state
                .inbox
                .accept(participant_id, action, self.clock.now(), alive);
        if !accepted {
            debug!(%participant_id, ?step, "night action ignored");
        }
        accepted
    }

    /// Records a day vote. Returns whether it was accepted; the last vote of
    /// a voter counts.
    pub async fn cast_vote(&self, voter_id: Uuid, target_id: Uuid) -> bool {
        let mut table = self.table.lock().await;
        let village = &mut table.village;
        let accepted = village.state.phase == Phase::Vote
            && village.is_alive(voter_id)
            && village.is_alive(target_id)
            && village
                .state
                .vote_box
                .accept(voter_id, target_id, self.clock.now());
        if !accepted {
            debug!(%voter_id, %target_id, "vote ignored");
        }
        accepted
    }

    /// Current public snapshot.
    pub async fn public_view(&self) -> PublicView {
        let table = self.table.lock().await;
        project_public(&table.village, self.clock.as_ref())
    }

    /// Current private snapshot of one participant.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ParticipantNotFound` for an unknown identifier.
    pub async fn private_view(&self, participant_id: Uuid) -> Result<PrivateView, DomainError> {
        let table = self.table.lock().await;
        project_private(&table.village, participant_id, self.clock.as_ref())
    }

    /// Current phase.
    pub async fn phase(&self) -> Phase {
        self.table.lock().await.village.state.phase
    }

    /// Greets a freshly registered viewer with the current snapshots.
    pub async fn welcome(&self, viewer: Viewer) {
        let (client, player_id) = match viewer.audience {
            Audience::Shared => ("tv", None),
            Audience::Participant(id) => ("player", Some(id)),
        };
        let hello = ServerEvent::Hello {
            client: client.to_owned(),
            player_id,
        };
        let (public, private) = {
            let table = self.table.lock().await;
            let public = project_public(&table.village, self.clock.as_ref());
            let private = player_id
                .and_then(|id| project_private(&table.village, id, self.clock.as_ref()).ok());
            (public, private)
        };

        self.deliver(viewer.viewer_id, &hello.to_payload()).await;
        self.deliver(
            viewer.viewer_id,
            &ServerEvent::PublicState { data: public }.to_payload(),
        )
        .await;
        if let Some(view) = private {
            self.deliver(
                viewer.viewer_id,
                &ServerEvent::PrivateState {
                    data: Box::new(view),
                }
                .to_payload(),
            )
            .await;
        }
    }

    /// Appends a narration line and pushes it to every viewer.
    pub(crate) async fn narrate(&self, text: &str) {
        let line = {
            let mut table = self.table.lock().await;
            table.village.narrate(text, self.clock.now())
        };
        self.broadcast(&ServerEvent::NarratorLine { line }).await;
    }

    /// Sends one event to every registered viewer.
    pub(crate) async fn broadcast(&self, event: &ServerEvent) {
        let payload = event.to_payload();
        for viewer in self.delivery.viewers() {
            self.deliver(viewer.viewer_id, &payload).await;
        }
    }

    /// Sends one event to every channel of one participant.
    pub(crate) async fn send_private(&self, participant_id: Uuid, event: &ServerEvent) {
        let payload = event.to_payload();
        for viewer in self.delivery.viewers() {
            if viewer.participant_id() == Some(participant_id) {
                self.deliver(viewer.viewer_id, &payload).await;
            }
        }
    }

    /// Pushes the public snapshot to everyone and each participant's private
    /// snapshot to their own channels.
    pub(crate) async fn sync_all(&self) {
        let viewers = self.delivery.viewers();
        let (public, privates) = {
            let table = self.table.lock().await;
            let public = project_public(&table.village, self.clock.as_ref());
            let privates: Vec<(Uuid, PrivateView)> = viewers
                .iter()
                .filter_map(|v| {
                    let id = v.participant_id()?;
                    project_private(&table.village, id, self.clock.as_ref())
                        .ok()
                        .map(|view| (v.viewer_id, view))
                })
                .collect();
            (public, privates)
        };

        self.broadcast(&ServerEvent::PublicState { data: public })
            .await;
        for (viewer_id, view) in privates {
            let event = ServerEvent::PrivateState {
                data: Box::new(view),
            };
            self.deliver(viewer_id, &event.to_payload()).await;
        }
    }

    async fn deliver(&self, viewer_id: Uuid, payload: &serde_json::Value) {
        if let Err(e) = self.delivery.send(viewer_id, payload).await {
            warn!(%viewer_id, error = %e, "delivery failed, dropping viewer");
            self.delivery.deregister(viewer_id);
        }
    }
}
