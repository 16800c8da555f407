//! REST API client for the Mux Video endpoints.
//!
//! Wraps asset creation and deletion using [`reqwest`] with HTTP basic auth
//! (access token id + secret).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::provider::{AssetProvider, ProviderError, SubmittedAsset};

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.mux.com";

/// Playback policy requested for every clip.
const PUBLIC_POLICY: &str = "public";

/// Credentials for the Mux API.
#[derive(Debug, Clone)]
pub struct MuxCredentials {
    pub token_id: String,
    pub token_secret: String,
}

/// HTTP client for the Mux Video API.
pub struct MuxClient {
    client: reqwest::Client,
    base_url: String,
    credentials: MuxCredentials,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CreateAssetRequest<'a> {
    input: Vec<InputSettings<'a>>,
    playback_policy: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct InputSettings<'a> {
    url: &'a str,
}

/// Envelope used by every Mux response.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Subset of the asset object this service needs.
#[derive(Debug, Deserialize)]
pub struct AssetResponse {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub playback_ids: Vec<PlaybackId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackId {
    pub id: String,
    #[serde(default)]
    pub policy: Option<String>,
}

impl MuxClient {
    /// Create a client against `base_url` (usually [`DEFAULT_BASE_URL`]).
    pub fn with_base_url(credentials: MuxCredentials, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Create an asset from a publicly reachable URL.
    ///
    /// Sends `POST /video/v1/assets` with a public playback policy and returns
    /// the created asset.
    pub async fn create_asset(&self, source_url: &str) -> Result<AssetResponse, ProviderError> {
        let body = CreateAssetRequest {
            input: vec![InputSettings { url: source_url }],
            playback_policy: vec![PUBLIC_POLICY],
        };

        let response = self
            .client
            .post(format!("{}/video/v1/assets", self.base_url))
            .basic_auth(&self.credentials.token_id, Some(&self.credentials.token_secret))
            .json(&body)
            .send()
            .await?;

        let envelope: DataEnvelope<AssetResponse> = Self::parse_response(response).await?;
        Ok(envelope.data)
    }

    /// Delete an asset and all of its playback ids.
    ///
    /// Sends `DELETE /video/v1/assets/{asset_id}`. A 404 maps to
    /// [`ProviderError::NotFound`].
    pub async fn remove_asset(&self, asset_id: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .delete(format!("{}/video/v1/assets/{}", self.base_url, asset_id))
            .basic_auth(&self.credentials.token_id, Some(&self.credentials.token_secret))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(asset_id.to_string()));
        }
        Self::ensure_success(response).await?;
        Ok(())
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or a [`ProviderError::Api`] carrying the status
    /// and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl AssetProvider for MuxClient {
    async fn submit_asset(&self, source_url: &str) -> Result<SubmittedAsset, ProviderError> {
        let asset = self.create_asset(source_url).await?;
        tracing::info!(
            asset_id = %asset.id,
            status = asset.status.as_deref().unwrap_or("unknown"),
            "Mux asset created"
        );
        let playback_id = asset
            .playback_ids
            .iter()
            .find(|p| p.policy.as_deref() == Some(PUBLIC_POLICY))
            .or_else(|| asset.playback_ids.first())
            .map(|p| p.id.clone());
        Ok(SubmittedAsset {
            asset_id: asset.id,
            playback_id,
        })
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<(), ProviderError> {
        self.remove_asset(asset_id).await?;
        tracing::info!(asset_id, "Mux asset deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use mockito::Matcher;

    use super::*;

    fn credentials() -> MuxCredentials {
        MuxCredentials {
            token_id: "token-id".to_string(),
            token_secret: "token-secret".to_string(),
        }
    }

    /// `Authorization` header for `token-id:token-secret`.
    const BASIC_AUTH: &str = "Basic dG9rZW4taWQ6dG9rZW4tc2VjcmV0";

    #[tokio::test]
    async fn submit_asset_posts_url_with_public_policy() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/video/v1/assets")
            .match_header("authorization", BASIC_AUTH)
            .match_body(Matcher::Json(serde_json::json!({
                "input": [{ "url": "http://example.test/clips/temp/clip1.mp4" }],
                "playback_policy": ["public"],
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{"id":"as456","status":"preparing",
                    "playback_ids":[{"id":"pb123","policy":"public"}]}}"#,
            )
            .create_async()
            .await;

        let client = MuxClient::with_base_url(credentials(), server.url());
        let asset = client
            .submit_asset("http://example.test/clips/temp/clip1.mp4")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(asset.asset_id, "as456");
        assert_eq!(asset.playback_id.as_deref(), Some("pb123"));
    }

    #[tokio::test]
    async fn submit_asset_without_playback_ids_returns_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/video/v1/assets")
            .with_status(201)
            .with_body(r#"{"data":{"id":"as456","status":"preparing"}}"#)
            .create_async()
            .await;

        let client = MuxClient::with_base_url(credentials(), server.url());
        let asset = client.submit_asset("http://example.test/a.mp4").await.unwrap();
        assert_eq!(asset.playback_id, None);
    }

    #[tokio::test]
    async fn submit_asset_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/video/v1/assets")
            .with_status(400)
            .with_body(r#"{"error":{"type":"invalid_parameters"}}"#)
            .create_async()
            .await;

        let client = MuxClient::with_base_url(credentials(), server.url());
        let result = client.submit_asset("not-a-url").await;
        assert_matches!(result, Err(ProviderError::Api { status: 400, body }) if body.contains("invalid_parameters"));
    }

    #[tokio::test]
    async fn delete_asset_succeeds_on_204() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/video/v1/assets/as456")
            .match_header("authorization", BASIC_AUTH)
            .with_status(204)
            .create_async()
            .await;

        let client = MuxClient::with_base_url(credentials(), server.url());
        client.delete_asset("as456").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_unknown_asset_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/video/v1/assets/gone")
            .with_status(404)
            .with_body(r#"{"error":{"type":"not_found"}}"#)
            .create_async()
            .await;

        let client = MuxClient::with_base_url(credentials(), server.url());
        let result = client.delete_asset("gone").await;
        assert_matches!(result, Err(ProviderError::NotFound(id)) if id == "gone");
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_ignored() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/video/v1/assets/as1")
            .with_status(204)
            .create_async()
            .await;

        let client = MuxClient::with_base_url(credentials(), format!("{}/", server.url()));
        client.delete_asset("as1").await.unwrap();
        mock.assert_async().await;
    }
}
