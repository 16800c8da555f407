//! The asset-provider contract.

use async_trait::async_trait;

/// Identifiers returned when the provider accepts a new asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedAsset {
    /// Provider-side asset id; required for deletion.
    pub asset_id: String,
    /// Public playback id, when the provider assigned one at creation time.
    pub playback_id: Option<String>,
}

/// Errors from the asset provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The referenced asset does not exist (or was already deleted).
    #[error("Asset `{0}` not found at provider")]
    NotFound(String),

    /// The asset was created but the response carried no playback id.
    #[error("Provider created asset `{0}` without a playback id")]
    MissingPlaybackId(String),
}

/// Thin contract over the external video-processing service.
///
/// Ingestion is by URL: the provider fetches the source itself and transcodes
/// out of band.
#[async_trait]
pub trait AssetProvider: Send + Sync {
    /// Request ingestion of the video at `source_url` with a public playback
    /// policy.
    async fn submit_asset(&self, source_url: &str) -> Result<SubmittedAsset, ProviderError>;

    /// Delete a previously created asset. An unknown or already deleted asset
    /// surfaces as [`ProviderError::NotFound`].
    async fn delete_asset(&self, asset_id: &str) -> Result<(), ProviderError>;
}
