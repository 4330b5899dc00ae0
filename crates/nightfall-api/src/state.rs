//! Shared application state.

use std::sync::Arc;

use nightfall_core::clock::SystemClock;
use nightfall_core::rng::SystemRng;
use nightfall_session::application::session::Session;

use crate::hub::ViewerHub;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The one live session.
    pub session: Arc<Session>,
    /// Connected screens; also the session's delivery collaborator.
    pub hub: Arc<ViewerHub>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(session: Arc<Session>, hub: Arc<ViewerHub>) -> Self {
        Self { session, hub }
    }

    /// State backed by the system clock and an entropy-seeded RNG.
    #[must_use]
    pub fn live() -> Self {
        let hub = Arc::new(ViewerHub::new());
        let session = Session::new(
            Arc::new(SystemClock),
            Box::new(SystemRng::from_entropy()),
            hub.clone(),
        );
        Self::new(Arc::new(session), hub)
    }
}
