//! Route definitions for the `/clips` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::clips;
use crate::state::AppState;

/// Routes mounted at the root.
///
/// ```text
/// GET    /clips                  -> list_clips
/// GET    /clips/{playback_id}    -> get_clip
/// DELETE /clips/{playback_id}    -> delete_clip (requires auth)
/// POST   /clips/upload           -> upload_clip (requires auth, multipart)
/// ```
///
/// `max_upload_bytes` bounds the multipart body of the upload route only.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/clips", get(clips::list_clips))
        .route(
            "/clips/upload",
            post(clips::upload_clip).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/clips/{playback_id}",
            get(clips::get_clip).delete(clips::delete_clip),
        )
}
