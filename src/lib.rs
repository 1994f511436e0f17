pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod schema;
pub mod services;
pub mod stores;
pub mod validation;

use crate::config::LoggingConfig;
use crate::middleware::auth::AuthService;
use crate::services::MilestoneStatusEngine;
use crate::stores::{MilestoneNoteStore, MilestoneStore, UserStore};
use std::sync::Arc;
use tracing::Level;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub milestones: MilestoneStatusEngine,
    /// User lookup for bearer-token authentication; may be cached.
    pub session_users: Arc<dyn UserStore>,
}

impl AppState {
    /// `user_store` must be authoritative: the engine checks the acting user's
    /// active flag against it on every operation. `session_user_store` only
    /// backs the auth middleware and may serve slightly stale users.
    pub fn new(
        auth_service: AuthService,
        milestone_store: Arc<dyn MilestoneStore>,
        note_store: Arc<dyn MilestoneNoteStore>,
        user_store: Arc<dyn UserStore>,
        session_user_store: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            auth_service,
            milestones: MilestoneStatusEngine::new(milestone_store, note_store, user_store),
            session_users: session_user_store,
        }
    }
}

pub fn init_tracing(logging: &LoggingConfig) {
    let level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt().with_max_level(level);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        "pretty" => builder.pretty().init(),
        _ => builder.init(),
    }
}
