use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::AuthSettings;
use crate::config::Environment;
use crate::media::SharedMediaStore;

/// Shared handles passed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub media: SharedMediaStore,
    pub auth: Arc<AuthSettings>,
    pub environment: Environment,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        media: SharedMediaStore,
        auth: AuthSettings,
        environment: Environment,
    ) -> Self {
        Self {
            pool,
            media,
            auth: Arc::new(auth),
            environment,
        }
    }
}
