use std::sync::Arc;

use lostsons_pipeline::ClipPipeline;

use crate::auth::discord::DiscordClient;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used by the health check.
    pub pool: lostsons_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Submission pipeline; also the entry point for clip reads and deletes.
    pub pipeline: Arc<ClipPipeline>,
    /// Discord OAuth2 client; `None` when login is not configured.
    pub discord: Option<Arc<DiscordClient>>,
}
