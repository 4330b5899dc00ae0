//! Routes for the live game: lobby management, submissions and snapshots.

use axum::extract::{Path, State};
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use nightfall_session::application::command_handlers;
use nightfall_session::domain::commands::{self, NightAction, NightStep};
use nightfall_session::domain::config::ConfigurePatch;
use nightfall_session::domain::views::{PrivateView, PublicView};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /join.
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    /// Requested display name; trimmed and shortened by the session.
    #[serde(default)]
    pub name: String,
}

/// Response body for POST /join.
#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub ok: bool,
    /// Identifier to use for submissions and the private channel.
    pub player_id: Uuid,
}

/// Request body for POST /action. Fields are read loosely: a submission
/// that names no known participant or step is dropped, not rejected.
#[derive(Debug, Deserialize)]
pub struct SubmitActionRequest {
    #[serde(default)]
    pub player_id: Value,
    #[serde(default)]
    pub step: Value,
    /// Step-specific payload; anything unreadable counts as "no action".
    #[serde(default)]
    pub data: Value,
}

impl SubmitActionRequest {
    /// The submitter and the typed action, if both can be read.
    fn into_parts(self) -> Option<(Uuid, NightAction)> {
        let player_id = serde_json::from_value(self.player_id).ok()?;
        let step: NightStep = serde_json::from_value(self.step).ok()?;
        Some((player_id, NightAction::from_step_data(step, self.data)))
    }
}

/// Request body for POST /vote, read as loosely as an action.
#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    #[serde(default)]
    pub voter_id: Value,
    #[serde(default)]
    pub target_id: Value,
}

impl CastVoteRequest {
    fn into_parts(self) -> Option<(Uuid, Uuid)> {
        let voter_id = serde_json::from_value(self.voter_id).ok()?;
        let target_id = serde_json::from_value(self.target_id).ok()?;
        Some((voter_id, target_id))
    }
}

/// Response body for commands without a payload.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Response body for submissions, which are never rejected with an error.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub ok: bool,
    /// Whether the session recorded the submission.
    pub accepted: bool,
}

/// POST /join
#[instrument(skip(state, request))]
async fn join(
    State(state): State<AppState>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    let command = commands::JoinVillage {
        correlation_id: Uuid::new_v4(),
        name: request.name,
    };

    info!(correlation_id = %command.correlation_id, "handling join command");

    let player_id = command_handlers::handle_join(&command, &state.session).await?;

    Ok(Json(JoinResponse {
        ok: true,
        player_id,
    }))
}

/// POST /start
#[instrument(skip(state))]
async fn start(State(state): State<AppState>) -> Result<Json<OkResponse>, ApiError> {
    let command = commands::StartGame {
        correlation_id: Uuid::new_v4(),
    };

    info!(correlation_id = %command.correlation_id, "handling start command");

    command_handlers::handle_start(&command, &state.session).await?;

    Ok(Json(OkResponse { ok: true }))
}

/// POST /reset
#[instrument(skip(state))]
async fn reset(State(state): State<AppState>) -> Json<OkResponse> {
    let command = commands::ResetGame {
        correlation_id: Uuid::new_v4(),
    };

    info!(correlation_id = %command.correlation_id, "handling reset command");

    command_handlers::handle_reset(&command, &state.session).await;

    Json(OkResponse { ok: true })
}

/// POST /config
#[instrument(skip(state, patch))]
async fn configure(
    State(state): State<AppState>,
    Json(patch): Json<ConfigurePatch>,
) -> Result<Json<OkResponse>, ApiError> {
    let command = commands::ConfigureGame {
        correlation_id: Uuid::new_v4(),
        patch,
    };

    info!(correlation_id = %command.correlation_id, "handling configure command");

    command_handlers::handle_configure(&command, &state.session).await?;

    Ok(Json(OkResponse { ok: true }))
}

/// POST /action
#[instrument(skip(state, request))]
async fn submit_action(
    State(state): State<AppState>,
    Json(request): Json<SubmitActionRequest>,
) -> Json<SubmissionResponse> {
    let Some((participant_id, action)) = request.into_parts() else {
        debug!("unreadable night action ignored");
        return Json(SubmissionResponse {
            ok: true,
            accepted: false,
        });
    };
    let command = commands::SubmitAction {
        correlation_id: Uuid::new_v4(),
        participant_id,
        action,
    };

    info!(
        correlation_id = %command.correlation_id,
        participant_id = %command.participant_id,
        step = ?command.action.step(),
        "handling submit_action command"
    );

    let accepted = command_handlers::handle_submit_action(&command, &state.session).await;

    Json(SubmissionResponse { ok: true, accepted })
}

/// POST /vote
#[instrument(skip(state, request))]
async fn cast_vote(
    State(state): State<AppState>,
    Json(request): Json<CastVoteRequest>,
) -> Json<SubmissionResponse> {
    let Some((voter_id, target_id)) = request.into_parts() else {
        debug!("unreadable vote ignored");
        return Json(SubmissionResponse {
            ok: true,
            accepted: false,
        });
    };
    let command = commands::CastVote {
        correlation_id: Uuid::new_v4(),
        voter_id,
        target_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        voter_id = %command.voter_id,
        "handling cast_vote command"
    );

    let accepted = command_handlers::handle_cast_vote(&command, &state.session).await;

    Json(SubmissionResponse { ok: true, accepted })
}

/// GET /state
async fn public_state(State(state): State<AppState>) -> Json<PublicView> {
    Json(state.session.public_view().await)
}

/// GET /state/{player_id}
async fn private_state(
    State(state): State<AppState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<PrivateView>, ApiError> {
    Ok(Json(state.session.private_view(player_id).await?))
}

/// Returns the router for the game.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/join", post(join))
        .route("/start", post(start))
        .route("/reset", post(reset))
        .route("/config", post(configure))
        .route("/action", post(submit_action))
        .route("/vote", post(cast_vote))
        .route("/state", get(public_state))
        .route("/state/{player_id}", get(private_state))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use nightfall_session::application::session::Session;
    use nightfall_test_support::{FixedClock, MockRng, SilentDelivery};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::hub::ViewerHub;

    fn test_app_state() -> AppState {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        let session = Session::new(Arc::new(clock), Box::new(MockRng), Arc::new(SilentDelivery));
        AppState::new(Arc::new(session), Arc::new(ViewerHub::new()))
    }

    fn post(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_join_returns_200_with_player_id() {
        // Arrange
        let app = router().with_state(test_app_state());

        // Act
        let response = app
            .oneshot(post("/join", &json!({ "name": "Alice" })))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["ok"], true);
        assert!(Uuid::parse_str(json["player_id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_start_with_empty_lobby_returns_400() {
        let app = router().with_state(test_app_state());

        let response = app.oneshot(post("/start", &json!({}))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_action_with_unknown_step_is_ignored_not_rejected() {
        // Arrange
        let app = router().with_state(test_app_state());

        // Act
        let response = app
            .oneshot(post(
                "/action",
                &json!({ "player_id": Uuid::new_v4(), "step": "HUNTER", "data": {} }),
            ))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["accepted"], false);
    }

    #[tokio::test]
    async fn test_action_with_malformed_player_id_is_ignored() {
        let app = router().with_state(test_app_state());

        let response = app
            .oneshot(post("/action", &json!({ "player_id": 7, "step": "SEER" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["accepted"], false);
    }

    #[tokio::test]
    async fn test_vote_with_malformed_ids_is_ignored() {
        let app = router().with_state(test_app_state());

        let response = app
            .oneshot(post(
                "/vote",
                &json!({ "voter_id": "nobody", "target_id": Uuid::new_v4() }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["accepted"], false);
    }

    #[tokio::test]
    async fn test_private_state_for_unknown_player_returns_404() {
        let app = router().with_state(test_app_state());
        let request = Request::builder()
            .uri(format!("/state/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
