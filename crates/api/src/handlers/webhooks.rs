//! Inbound provider webhooks.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use lostsons_mux::webhook::{parse_asset_event, verify_signature, AssetEvent, SIGNATURE_HEADER};
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

/// Acknowledgement returned for every accepted webhook.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// Whether a pending clip was resolved by this delivery.
    pub resolved: bool,
}

/// POST /webhooks/mux
///
/// Verifies the signature when a secret is configured, then resolves the
/// pending clip named by a `video.asset.ready` event. A
/// `video.asset.errored` event releases the staged upload. Other event kinds
/// and unknown uploads are acknowledged with `resolved: false`.
pub async fn mux_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    if let Some(secret) = state.config.mux.webhook_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        verify_signature(secret, signature, &body, chrono::Utc::now().timestamp())?;
    }

    let resolved = match parse_asset_event(&body)? {
        Some(AssetEvent::Ready(notification)) => {
            state.pipeline.resolve_ready(&notification).await?
        }
        Some(AssetEvent::Errored(failure)) => {
            state.pipeline.ingestion_failed(&failure);
            false
        }
        None => false,
    };

    Ok(Json(WebhookAck { resolved }))
}
