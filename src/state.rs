use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{config::Config, store::EventStore, utils::media::ImageHost};

#[derive(Clone)]
pub struct AppState {
    /// Accounts live here; events go through `events`.
    pub pool: PgPool,
    pub config: Config,
    pub events: Arc<dyn EventStore>,
    pub images: Arc<dyn ImageHost>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn EventStore> {
    fn from_ref(state: &AppState) -> Self {
        state.events.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ImageHost> {
    fn from_ref(state: &AppState) -> Self {
        state.images.clone()
    }
}
