use std::sync::Arc;

use crate::config::Config;
use crate::session::SessionController;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The one session this process hosts.
    pub controller: Arc<SessionController>,
    pub config: Config,
}
