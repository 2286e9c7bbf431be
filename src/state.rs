//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers and the session gate via the
//! `State` extractor. Clone is required by Axum: all fields are Arc-backed.

use std::sync::Arc;

use crate::config::Config;
use crate::logging::Logger;
use crate::services::auth_context::AuthContext;
use crate::services::backend::IdentityBackend;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub logger: Logger,
    pub auth: AuthContext,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, logger: Logger, backend: Arc<dyn IdentityBackend>) -> Self {
        Self { config: Arc::new(config), logger, auth: AuthContext::new(backend) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
