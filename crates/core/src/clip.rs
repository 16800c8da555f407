//! Clip metadata limits and submission validation.
//!
//! The limits mirror the `VARCHAR` widths of the `clips` table so that an
//! oversized field is rejected as a client error before anything is staged or
//! sent to the provider, instead of failing later inside the INSERT.

use chrono::SubsecRound;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Column limits (characters)
// ---------------------------------------------------------------------------

pub const MAX_UPLOADED_BY_LEN: usize = 35;
pub const MAX_TITLE_LEN: usize = 60;
pub const MAX_DESCRIPTION_LEN: usize = 120;
pub const MAX_GAME_LEN: usize = 60;
pub const MAX_TAGS_LEN: usize = 100;
pub const MAX_PLAYERS_LEN: usize = 255;

// ---------------------------------------------------------------------------
// Submitted metadata
// ---------------------------------------------------------------------------

/// Free-form metadata submitted alongside a video file.
///
/// Empty strings are accepted; only the length of each field is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipFields {
    pub uploaded_by: String,
    pub title: String,
    pub description: String,
    pub game: String,
    pub tags: String,
    pub players: String,
}

impl ClipFields {
    /// Check every field against its column limit.
    ///
    /// Lengths are counted in characters, matching PostgreSQL `VARCHAR(n)`.
    pub fn validate(&self) -> Result<(), CoreError> {
        check_len("username", &self.uploaded_by, MAX_UPLOADED_BY_LEN)?;
        check_len("title", &self.title, MAX_TITLE_LEN)?;
        check_len("description", &self.description, MAX_DESCRIPTION_LEN)?;
        check_len("game", &self.game, MAX_GAME_LEN)?;
        check_len("tags", &self.tags, MAX_TAGS_LEN)?;
        check_len("players", &self.players, MAX_PLAYERS_LEN)?;
        Ok(())
    }
}

/// Reject `value` if it is longer than `max` characters.
pub fn check_len(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    let len = value.chars().count();
    if len > max {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max} characters (got {len})"
        )));
    }
    Ok(())
}

/// Current time truncated to microseconds, the resolution of `TIMESTAMPTZ`.
///
/// Truncating at creation means the value handed back by the database is
/// identical to the one that was written.
pub fn upload_timestamp() -> Timestamp {
    chrono::Utc::now().trunc_subsecs(6)
}
