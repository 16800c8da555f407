/// Errors surfaced by a [`ClipStore`](crate::ClipStore) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No clip matches the given playback id.
    #[error("clip with playback id `{0}` does not exist")]
    NotFound(String),

    /// A uniqueness constraint (`playback_id` or `asset_id`) was violated.
    #[error("clip already exists: {0}")]
    Conflict(String),

    /// Any other database failure (connectivity, decoding, ...).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

impl StoreError {
    /// Classify an INSERT/UPDATE failure, turning unique violations into
    /// [`StoreError::Conflict`] and passing everything else through.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unknown");
                let column = match constraint {
                    "pk_clips" => "playback_id",
                    "uq_clips_asset_id" => "asset_id",
                    other => other,
                };
                return StoreError::Conflict(format!("duplicate {column}"));
            }
        }
        StoreError::Database(err)
    }
}
