//! Handlers for the `/clips` resource.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use lostsons_core::clip::ClipFields;
use lostsons_core::error::CoreError;
use lostsons_db::models::clip::Clip;
use lostsons_pipeline::{ClipSubmission, SubmissionOutcome};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Multipart field carrying the video bytes.
const VIDEO_FIELD: &str = "videofile";

/// Response body for `DELETE /clips/{playback_id}`.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: String,
}

/// GET /clips
///
/// Every resolved clip, newest first.
pub async fn list_clips(State(state): State<AppState>) -> AppResult<Json<Vec<Clip>>> {
    let clips = state.pipeline.list().await?;
    Ok(Json(clips))
}

/// GET /clips/{playback_id}
pub async fn get_clip(
    State(state): State<AppState>,
    Path(playback_id): Path<String>,
) -> AppResult<Json<Clip>> {
    let clip = state.pipeline.get(&playback_id).await?;
    Ok(Json(clip))
}

/// DELETE /clips/{playback_id}
///
/// Removes the provider asset, then the clip row.
pub async fn delete_clip(
    user: AuthUser,
    State(state): State<AppState>,
    Path(playback_id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    tracing::info!(username = %user.username, playback_id = %playback_id, "Deleting clip");
    state.pipeline.delete(&playback_id).await?;
    Ok(Json(DeleteResponse {
        deleted: playback_id,
    }))
}

/// POST /clips/upload
///
/// Multipart form with text fields `title`, `description`, `game`, `tags`,
/// `players`, `username` and the file field `videofile`. An empty `username`
/// falls back to the session user.
///
/// Returns `200` with the clip when it is immediately playable, or `202` with
/// the pending clip when the playback id arrives later by webhook.
pub async fn upload_clip(
    user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Clip>)> {
    let mut fields = ClipFields::default();
    let mut video: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            VIDEO_FIELD => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                video = Some((file_name, data.to_vec()));
            }
            "username" => fields.uploaded_by = field.text().await?,
            "title" => fields.title = field.text().await?,
            "description" => fields.description = field.text().await?,
            "game" => fields.game = field.text().await?,
            "tags" => fields.tags = field.text().await?,
            "players" => fields.players = field.text().await?,
            other => tracing::debug!(field = other, "Ignoring unknown upload field"),
        }
    }

    let (file_name, data) = video.ok_or_else(|| {
        CoreError::Validation(format!("missing {VIDEO_FIELD} field"))
    })?;

    if fields.uploaded_by.trim().is_empty() {
        fields.uploaded_by = user.username;
    }

    let outcome = state
        .pipeline
        .submit(ClipSubmission {
            fields,
            file_name,
            data,
        })
        .await?;

    Ok(match outcome {
        SubmissionOutcome::Created(clip) => (StatusCode::OK, Json(clip)),
        SubmissionOutcome::Pending(clip) => (StatusCode::ACCEPTED, Json(clip)),
    })
}
