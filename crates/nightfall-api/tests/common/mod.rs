//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use nightfall_core::clock::Clock;
use nightfall_session::application::session::Session;
use nightfall_test_support::{FixedClock, MockRng};
use tower::ServiceExt;

use nightfall_api::hub::ViewerHub;
use nightfall_api::routes;
use nightfall_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Application state with a deterministic clock and RNG, delivering through a
/// real hub.
pub fn test_state() -> AppState {
    let hub = Arc::new(ViewerHub::new());
    let session = Session::new(fixed_clock(), Box::new(MockRng), hub.clone());
    AppState::new(Arc::new(session), hub)
}

/// Build the full app router. Uses the same route structure as `main.rs`.
pub fn build_test_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::ws::router())
        .nest("/api", routes::game::router())
        .with_state(state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Joins `count` participants named P1..Pn and returns their identifiers.
pub async fn join_many(state: &AppState, count: usize) -> Vec<String> {
    let mut ids = Vec::with_capacity(count);
    for i in 1..=count {
        let (status, json) = post_json(
            build_test_app(state.clone()),
            "/api/join",
            &serde_json::json!({ "name": format!("P{i}") }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        ids.push(json["player_id"].as_str().unwrap().to_owned());
    }
    ids
}
