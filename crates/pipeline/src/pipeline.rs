//! Orchestration of submit, delete, and ready-notification resolution.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use lostsons_core::clip::ClipFields;
use lostsons_core::error::CoreError;
use lostsons_db::models::clip::Clip;
use lostsons_db::{ClipStore, StoreError};
use lostsons_mux::webhook::{ErroredNotification, ReadyNotification};
use lostsons_mux::{AssetProvider, ProviderError};

use crate::error::PipelineError;
use crate::staging::StagingArea;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a new clip obtains its final playback id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionMode {
    /// The provider's create response carries the playback id; the row is
    /// created ready.
    #[default]
    Sync,
    /// The row is created pending, keyed by the asset id, and resolved by the
    /// `video.asset.ready` webhook.
    Webhook,
}

impl FromStr for ResolutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(ResolutionMode::Sync),
            "webhook" => Ok(ResolutionMode::Webhook),
            other => Err(format!(
                "unknown resolution mode '{other}' (expected 'sync' or 'webhook')"
            )),
        }
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolutionMode::Sync => "sync",
            ResolutionMode::Webhook => "webhook",
        })
    }
}

/// One clip upload: metadata plus the raw video bytes.
#[derive(Debug, Clone)]
pub struct ClipSubmission {
    pub fields: ClipFields,
    /// Original client-side file name; only used to derive the staged name.
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The clip is stored and immediately visible.
    Created(Clip),
    /// The clip is stored pending; it becomes visible once the provider's
    /// ready notification arrives.
    Pending(Clip),
}

impl SubmissionOutcome {
    pub fn clip(&self) -> &Clip {
        match self {
            SubmissionOutcome::Created(clip) | SubmissionOutcome::Pending(clip) => clip,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Coordinates staging, the asset provider, and the clip store.
pub struct ClipPipeline {
    store: Arc<dyn ClipStore>,
    provider: Arc<dyn AssetProvider>,
    staging: StagingArea,
    mode: ResolutionMode,
}

impl ClipPipeline {
    pub fn new(
        store: Arc<dyn ClipStore>,
        provider: Arc<dyn AssetProvider>,
        staging: StagingArea,
        mode: ResolutionMode,
    ) -> Self {
        Self {
            store,
            provider,
            staging,
            mode,
        }
    }

    /// Stage the upload, submit it to the provider, and persist the clip.
    ///
    /// On success the staged file stays reachable, held under the asset id,
    /// until the provider reports the asset ready or errored. On failure it is
    /// removed before this returns.
    pub async fn submit(
        &self,
        submission: ClipSubmission,
    ) -> Result<SubmissionOutcome, PipelineError> {
        let ClipSubmission {
            fields,
            file_name,
            data,
        } = submission;

        if data.is_empty() {
            return Err(CoreError::Validation("videofile must not be empty".into()).into());
        }
        fields.validate()?;

        let staged = self
            .staging
            .stage(&file_name, &data)
            .await
            .map_err(PipelineError::Staging)?;
        tracing::info!(
            staged = %staged.path().display(),
            url = staged.url(),
            bytes = data.len(),
            "Upload staged"
        );

        let asset = self.provider.submit_asset(staged.url()).await.map_err(|e| {
            tracing::warn!(error = %e, url = staged.url(), "Provider rejected submission");
            e
        })?;

        let outcome = match self.mode {
            ResolutionMode::Sync => {
                let Some(playback_id) = asset.playback_id else {
                    self.compensate(&asset.asset_id, "no playback id returned").await;
                    return Err(ProviderError::MissingPlaybackId(asset.asset_id).into());
                };
                SubmissionOutcome::Created(Clip::ready(playback_id, asset.asset_id, fields))
            }
            ResolutionMode::Webhook => SubmissionOutcome::Pending(Clip::pending(
                asset.asset_id.clone(),
                asset.asset_id,
                fields,
            )),
        };

        let clip = outcome.clip();
        if let Err(err) = self.store.create(clip).await {
            self.compensate(&clip.asset_id, &err).await;
            return Err(err.into());
        }

        tracing::info!(
            playback_id = %clip.playback_id,
            asset_id = %clip.asset_id,
            pending = clip.is_pending(),
            "Clip submitted"
        );
        self.staging.hold(&clip.asset_id, staged);
        Ok(outcome)
    }

    /// Look up a resolved clip.
    pub async fn get(&self, playback_id: &str) -> Result<Clip, PipelineError> {
        Ok(self.store.get_by_playback_id(playback_id).await?)
    }

    /// All resolved clips.
    pub async fn list(&self) -> Result<Vec<Clip>, PipelineError> {
        Ok(self.store.list_all().await?)
    }

    /// Delete the provider asset, then the clip row.
    ///
    /// An asset already gone at the provider does not block removing the row.
    /// Any other provider failure aborts and keeps the row, so the asset id
    /// is not lost.
    pub async fn delete(&self, playback_id: &str) -> Result<(), PipelineError> {
        let clip = self.store.get_by_playback_id(playback_id).await?;

        match self.provider.delete_asset(&clip.asset_id).await {
            Ok(()) => {}
            Err(ProviderError::NotFound(_)) => {
                tracing::warn!(
                    playback_id,
                    asset_id = %clip.asset_id,
                    "Provider asset already deleted; removing clip row"
                );
            }
            Err(e) => return Err(e.into()),
        }
        self.staging.release(&clip.asset_id);

        if let Err(err) = self.store.delete(playback_id).await {
            if !matches!(err, StoreError::NotFound(_)) {
                tracing::error!(
                    playback_id,
                    asset_id = %clip.asset_id,
                    error = %err,
                    "Provider asset deleted but clip row remains; manual cleanup required"
                );
            }
            return Err(err.into());
        }

        tracing::info!(playback_id, asset_id = %clip.asset_id, "Clip deleted");
        Ok(())
    }

    /// Apply a ready notification to the pending row it refers to, and
    /// release the asset's staged file.
    ///
    /// Returns `false` when no pending row matched; that is expected for
    /// assets created in [`ResolutionMode::Sync`] and for redeliveries.
    pub async fn resolve_ready(
        &self,
        notification: &ReadyNotification,
    ) -> Result<bool, PipelineError> {
        self.staging.release(&notification.asset_id);

        let resolved = self
            .store
            .update_playback_id(&notification.upload_id, &notification.playback_id)
            .await?;

        if resolved {
            tracing::info!(
                upload_id = %notification.upload_id,
                playback_id = %notification.playback_id,
                "Pending clip resolved"
            );
        } else {
            tracing::debug!(
                upload_id = %notification.upload_id,
                "No pending clip for ready notification"
            );
        }
        Ok(resolved)
    }

    /// Release the staged file of an asset the provider failed to ingest.
    ///
    /// A pending row for the asset never resolves and stays invisible.
    pub fn ingestion_failed(&self, notification: &ErroredNotification) -> bool {
        let released = self.staging.release(&notification.asset_id);
        tracing::warn!(
            upload_id = %notification.upload_id,
            asset_id = %notification.asset_id,
            messages = ?notification.messages,
            released,
            "Provider failed to ingest asset"
        );
        released
    }

    /// Best-effort removal of a provider asset that has no clip row.
    async fn compensate(&self, asset_id: &str, reason: impl fmt::Display) {
        match self.provider.delete_asset(asset_id).await {
            Ok(()) => {
                tracing::warn!(asset_id, reason = %reason, "Rolled back provider asset");
            }
            Err(e) => {
                tracing::error!(
                    asset_id,
                    reason = %reason,
                    error = %e,
                    "Orphaned provider asset; manual cleanup required"
                );
            }
        }
    }
}
