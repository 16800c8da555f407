pub mod auth;
pub mod clips;
pub mod health;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the application route tree.
///
/// Route hierarchy:
///
/// ```text
/// /clips                       list (public)
/// /clips/{playback_id}         get (public), delete (requires auth)
/// /clips/upload                submit (requires auth)
///
/// /login, /redirect, /logout   Discord login flow
/// /me                          current session
///
/// /webhooks/mux                provider notifications
/// ```
pub fn app_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(clips::router(max_upload_bytes))
        .merge(auth::router())
        .merge(webhooks::router())
}
