//! WebSocket push channel.
//!
//! `GET /ws?client=tv` joins the shared audience; `client=player` with a
//! `player_id` joins that participant's private audience. The socket gets a
//! greeting and current snapshots, then every event the session pushes. A
//! `{"type":"PING"}` text frame (or anything unparseable) is answered with
//! `PONG`.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Router, routing::get};
use futures_util::{SinkExt, StreamExt};
use nightfall_core::delivery::{Audience, MessageDelivery};
use nightfall_core::event::DomainEvent;
use nightfall_session::domain::events::ServerEvent;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Query string of the upgrade request.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    /// `tv` or `player`; defaults to `tv`.
    pub client: Option<String>,
    pub player_id: Option<Uuid>,
}

impl ConnectParams {
    /// Audience for these parameters, or `None` for an unknown client kind.
    #[must_use]
    pub fn audience(&self) -> Option<Audience> {
        match (self.client.as_deref().unwrap_or("tv"), self.player_id) {
            ("tv", _) | ("player", None) => Some(Audience::Shared),
            ("player", Some(id)) => Some(Audience::Participant(id)),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ClientFrame {
    #[serde(rename = "type")]
    kind: String,
}

/// Whether an incoming text frame asks for a `PONG`.
fn wants_pong(text: &str) -> bool {
    serde_json::from_str::<ClientFrame>(text).map_or(true, |frame| frame.kind == "PING")
}

/// GET /ws
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    let Some(audience) = params.audience() else {
        return (StatusCode::BAD_REQUEST, "client must be tv or player").into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, audience, state))
}

async fn handle_socket(socket: WebSocket, audience: Audience, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (viewer, mut rx) = state.hub.register(audience);
    let viewer_id = viewer.viewer_id;
    info!(%viewer_id, ?audience, "viewer connected");

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if ws_sender
                .send(Message::Text(message.to_string().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    state.session.welcome(viewer).await;

    let pong = ServerEvent::Pong.to_payload();
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if wants_pong(text.as_str()) && state.hub.send(viewer_id, &pong).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!(%viewer_id, error = %e, "websocket error");
                break;
            }
            _ => {}
        }
    }

    state.hub.deregister(viewer_id);
    send_task.abort();
    info!(%viewer_id, "viewer disconnected");
}

/// Returns the push-channel router.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}
