//! Clip storage: the [`ClipStore`] trait and its PostgreSQL implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::clip::{Clip, ClipStatus};

/// Column list for `clips` queries.
const CLIP_COLUMNS: &str = "\
    playback_id, uploaded_by, title, description, game, tags, players, \
    date_uploaded, asset_id, status";

/// Durable storage and retrieval of clip metadata, keyed by playback id.
///
/// Implementations must be safe to share between concurrently running
/// request handlers.
#[async_trait]
pub trait ClipStore: Send + Sync {
    /// Insert a new clip. Fails with [`StoreError::Conflict`] if the playback
    /// id or asset id is already taken; the existing row is left untouched.
    async fn create(&self, clip: &Clip) -> Result<(), StoreError>;

    /// Fetch a resolved clip. Pending rows are reported as not found.
    async fn get_by_playback_id(&self, playback_id: &str) -> Result<Clip, StoreError>;

    /// All resolved clips, newest first. Unbounded.
    async fn list_all(&self) -> Result<Vec<Clip>, StoreError>;

    /// Remove a clip row. Fails with [`StoreError::NotFound`] if nothing
    /// matched, so the loser of two concurrent deletes observes not-found.
    async fn delete(&self, playback_id: &str) -> Result<(), StoreError>;

    /// Resolve the pending row keyed by `upload_id` to its final playback id.
    ///
    /// Returns `false` when no pending row matched (unknown or already
    /// resolved upload); that is a no-op, not an error.
    async fn update_playback_id(
        &self,
        upload_id: &str,
        playback_id: &str,
    ) -> Result<bool, StoreError>;
}

/// [`ClipStore`] backed by the PostgreSQL `clips` table.
#[derive(Clone)]
pub struct PgClipStore {
    pool: PgPool,
}

impl PgClipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClipStore for PgClipStore {
    async fn create(&self, clip: &Clip) -> Result<(), StoreError> {
        let query = format!(
            "INSERT INTO clips ({CLIP_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        );
        sqlx::query(&query)
            .bind(&clip.playback_id)
            .bind(&clip.uploaded_by)
            .bind(&clip.title)
            .bind(&clip.description)
            .bind(&clip.game)
            .bind(&clip.tags)
            .bind(&clip.players)
            .bind(clip.date_uploaded)
            .bind(&clip.asset_id)
            .bind(clip.status.as_str())
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_write)?;

        tracing::debug!(
            playback_id = %clip.playback_id,
            asset_id = %clip.asset_id,
            status = clip.status.as_str(),
            "Clip row inserted"
        );
        Ok(())
    }

    async fn get_by_playback_id(&self, playback_id: &str) -> Result<Clip, StoreError> {
        let query = format!("SELECT {CLIP_COLUMNS} FROM clips WHERE playback_id = $1 AND status = $2");
        sqlx::query_as::<_, Clip>(&query)
            .bind(playback_id)
            .bind(ClipStatus::Ready.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(playback_id.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<Clip>, StoreError> {
        let query = format!(
            "SELECT {CLIP_COLUMNS} FROM clips WHERE status = $1 \
             ORDER BY date_uploaded DESC, playback_id"
        );
        let clips = sqlx::query_as::<_, Clip>(&query)
            .bind(ClipStatus::Ready.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(clips)
    }

    async fn delete(&self, playback_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM clips WHERE playback_id = $1")
            .bind(playback_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(playback_id.to_string()));
        }
        Ok(())
    }

    async fn update_playback_id(
        &self,
        upload_id: &str,
        playback_id: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE clips SET playback_id = $2, status = $3 \
             WHERE playback_id = $1 AND status = $4",
        )
        .bind(upload_id)
        .bind(playback_id)
        .bind(ClipStatus::Ready.as_str())
        .bind(ClipStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_write)?;
        Ok(result.rows_affected() > 0)
    }
}
