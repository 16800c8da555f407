//! Clip row model.

use lostsons_core::clip::{upload_timestamp, ClipFields};
use lostsons_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Resolution state of a clip row.
///
/// `Pending` rows exist only in the webhook-resolved variant: they are keyed
/// by the provider's upload placeholder until the ready notification supplies
/// the final playback id. Listing and lookup only ever see `Ready` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipStatus {
    Pending,
    Ready,
}

impl ClipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ClipStatus::Pending => "pending",
            ClipStatus::Ready => "ready",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown clip status '{0}'")]
pub struct UnknownStatus(String);

impl TryFrom<String> for ClipStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(ClipStatus::Pending),
            "ready" => Ok(ClipStatus::Ready),
            _ => Err(UnknownStatus(value)),
        }
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `clips` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub playback_id: String,
    pub uploaded_by: String,
    pub title: String,
    pub description: String,
    pub game: String,
    pub tags: String,
    pub players: String,
    pub date_uploaded: Timestamp,
    pub asset_id: String,
    #[sqlx(try_from = "String")]
    pub status: ClipStatus,
}

impl Clip {
    /// A fully resolved clip, visible to listing and lookup immediately.
    pub fn ready(playback_id: String, asset_id: String, fields: ClipFields) -> Self {
        Self::build(playback_id, asset_id, fields, ClipStatus::Ready)
    }

    /// A placeholder keyed by `upload_id` until the ready notification lands.
    pub fn pending(upload_id: String, asset_id: String, fields: ClipFields) -> Self {
        Self::build(upload_id, asset_id, fields, ClipStatus::Pending)
    }

    fn build(playback_id: String, asset_id: String, fields: ClipFields, status: ClipStatus) -> Self {
        let ClipFields {
            uploaded_by,
            title,
            description,
            game,
            tags,
            players,
        } = fields;
        Self {
            playback_id,
            uploaded_by,
            title,
            description,
            game,
            tags,
            players,
            date_uploaded: upload_timestamp(),
            asset_id,
            status,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ClipStatus::Pending
    }
}
