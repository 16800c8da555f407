//! Inbound Mux webhook handling.
//!
//! Mux posts a JSON event for every asset state change. Two kinds require
//! action: `video.asset.ready` carries the final playback id and the
//! identifier the pending clip row was keyed by, and `video.asset.errored`
//! reports that ingestion gave up. Every other event kind is acknowledged and
//! ignored.
//!
//! When a signing secret is configured, each request carries a
//! `mux-signature: t=<unix>,v1=<hex>` header where `v1` is
//! `HMAC-SHA256(secret, "<t>.<raw body>")`.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::client::PlaybackId;

/// Event kind that resolves a pending clip.
pub const ASSET_READY: &str = "video.asset.ready";

/// Event kind sent when the provider could not ingest the input.
pub const ASSET_ERRORED: &str = "video.asset.errored";

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "mux-signature";

/// Maximum accepted age of a signed webhook, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Errors raised while accepting a webhook.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("malformed webhook payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("ready notification for asset `{0}` has no playback id")]
    MissingPlaybackId(String),

    #[error("missing {SIGNATURE_HEADER} header")]
    MissingSignature,

    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("webhook signature timestamp is outside the accepted window")]
    Expired,
}

/// Envelope of every webhook event.
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// `data` object of a `video.asset.ready` event.
#[derive(Debug, Deserialize)]
struct ReadyAsset {
    id: String,
    #[serde(default)]
    upload_id: Option<String>,
    #[serde(default)]
    playback_ids: Vec<PlaybackId>,
}

/// `data` object of a `video.asset.errored` event.
#[derive(Debug, Deserialize)]
struct ErroredAsset {
    id: String,
    #[serde(default)]
    upload_id: Option<String>,
    #[serde(default)]
    errors: Option<AssetErrors>,
}

#[derive(Debug, Deserialize)]
struct AssetErrors {
    #[serde(default)]
    messages: Vec<String>,
}

/// An asset event the pipeline acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetEvent {
    Ready(ReadyNotification),
    Errored(ErroredNotification),
}

/// Ingestion failure for an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErroredNotification {
    pub upload_id: String,
    pub asset_id: String,
    /// Provider-supplied reasons, possibly empty.
    pub messages: Vec<String>,
}

/// The correlation extracted from a ready notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyNotification {
    /// Key of the pending clip row: the direct-upload id when the asset came
    /// from a direct upload, otherwise the asset id returned at submission.
    pub upload_id: String,
    /// Final public playback id.
    pub playback_id: String,
    pub asset_id: String,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a webhook body.
///
/// Returns `Ok(None)` for every event kind other than [`ASSET_READY`] and
/// [`ASSET_ERRORED`].
pub fn parse_asset_event(body: &[u8]) -> Result<Option<AssetEvent>, WebhookError> {
    let event: WebhookEvent = serde_json::from_slice(body)?;
    match event.kind.as_str() {
        ASSET_READY => parse_ready(event.data).map(|n| Some(AssetEvent::Ready(n))),
        ASSET_ERRORED => {
            let asset: ErroredAsset = serde_json::from_value(event.data)?;
            Ok(Some(AssetEvent::Errored(ErroredNotification {
                upload_id: asset.upload_id.unwrap_or_else(|| asset.id.clone()),
                asset_id: asset.id,
                messages: asset.errors.map(|e| e.messages).unwrap_or_default(),
            })))
        }
        other => {
            tracing::debug!(kind = %other, "Ignoring webhook event");
            Ok(None)
        }
    }
}

fn parse_ready(data: serde_json::Value) -> Result<ReadyNotification, WebhookError> {
    let asset: ReadyAsset = serde_json::from_value(data)?;
    let playback_id = asset
        .playback_ids
        .first()
        .map(|p| p.id.clone())
        .ok_or_else(|| WebhookError::MissingPlaybackId(asset.id.clone()))?;

    Ok(ReadyNotification {
        upload_id: asset.upload_id.unwrap_or_else(|| asset.id.clone()),
        playback_id,
        asset_id: asset.id,
    })
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

/// Compute the hex `v1` signature for `body` signed at `timestamp`.
pub fn sign(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let mac = signed_payload_mac(secret, timestamp, body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a `mux-signature` header value against the raw body.
///
/// `now` is the current Unix time; signatures older (or newer) than
/// [`SIGNATURE_TOLERANCE_SECS`] are rejected.
pub fn verify_signature(
    secret: &str,
    header: Option<&str>,
    body: &[u8],
    now: i64,
) -> Result<(), WebhookError> {
    let header = header.ok_or(WebhookError::MissingSignature)?;

    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::InvalidSignature)?;
    if now.abs_diff(timestamp) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(WebhookError::Expired);
    }

    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|expected| {
                signed_payload_mac(secret, timestamp, body)
                    .verify_slice(&expected)
                    .is_ok()
            })
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

fn signed_payload_mac(secret: &str, timestamp: i64, body: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac
}

// ---------------------------------------------------------------------------
// hex helpers (no extra dep)
// ---------------------------------------------------------------------------

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string; `None` on odd length or non-hex characters.
    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| s.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const READY_WITH_UPLOAD: &str = r#"{
        "type": "video.asset.ready",
        "object": {"type": "asset", "id": "as456"},
        "id": "evt-1",
        "data": {
            "id": "as456",
            "upload_id": "up789",
            "status": "ready",
            "playback_ids": [{"policy": "public", "id": "pb123"}],
            "duration": 12.5
        }
    }"#;

    fn ready(body: &str) -> ReadyNotification {
        let event = parse_asset_event(body.as_bytes()).unwrap();
        assert_matches!(event, Some(AssetEvent::Ready(n)) => n)
    }

    #[test]
    fn ready_event_with_upload_id_correlates_by_upload() {
        let n = ready(READY_WITH_UPLOAD);
        assert_eq!(n.upload_id, "up789");
        assert_eq!(n.playback_id, "pb123");
        assert_eq!(n.asset_id, "as456");
    }

    #[test]
    fn ready_event_without_upload_id_correlates_by_asset() {
        let body = r#"{"type":"video.asset.ready",
            "data":{"id":"as456","playback_ids":[{"id":"pb123","policy":"public"}]}}"#;
        let n = ready(body);
        assert_eq!(n.upload_id, "as456");
        assert_eq!(n.playback_id, "pb123");
    }

    #[test]
    fn errored_event_carries_asset_and_messages() {
        let body = r#"{"type":"video.asset.errored",
            "data":{"id":"as456","status":"errored",
                "errors":{"type":"invalid_input","messages":["Input URL returned 404"]}}}"#;
        let event = parse_asset_event(body.as_bytes()).unwrap();
        let n = assert_matches!(event, Some(AssetEvent::Errored(n)) => n);
        assert_eq!(n.asset_id, "as456");
        assert_eq!(n.upload_id, "as456");
        assert_eq!(n.messages, vec!["Input URL returned 404".to_string()]);
    }

    #[test]
    fn errored_event_without_errors_object_is_accepted() {
        let body = r#"{"type":"video.asset.errored","data":{"id":"as456","upload_id":"up1"}}"#;
        let event = parse_asset_event(body.as_bytes()).unwrap();
        let n = assert_matches!(event, Some(AssetEvent::Errored(n)) => n);
        assert_eq!(n.upload_id, "up1");
        assert!(n.messages.is_empty());
    }

    #[test]
    fn other_event_kinds_are_ignored() {
        let body = r#"{"type":"video.asset.created","data":{"id":"as456"}}"#;
        assert_eq!(parse_asset_event(body.as_bytes()).unwrap(), None);

        let body = r#"{"type":"video.upload.cancelled","data":{"whatever":true}}"#;
        assert_eq!(parse_asset_event(body.as_bytes()).unwrap(), None);
    }

    #[test]
    fn ready_event_without_playback_ids_is_rejected() {
        let body = r#"{"type":"video.asset.ready","data":{"id":"as456","playback_ids":[]}}"#;
        assert_matches!(
            parse_asset_event(body.as_bytes()),
            Err(WebhookError::MissingPlaybackId(id)) if id == "as456"
        );
    }

    #[test]
    fn garbage_body_is_malformed() {
        assert_matches!(
            parse_asset_event(b"not json"),
            Err(WebhookError::Malformed(_))
        );
    }

    #[test]
    fn valid_signature_verifies() {
        let body = READY_WITH_UPLOAD.as_bytes();
        let sig = sign("whsec", 1_700_000_000, body);
        let header = format!("t=1700000000,v1={sig}");
        assert!(verify_signature("whsec", Some(&header), body, 1_700_000_010).is_ok());
    }

    #[test]
    fn signature_with_wrong_secret_fails() {
        let body = READY_WITH_UPLOAD.as_bytes();
        let sig = sign("other", 1_700_000_000, body);
        let header = format!("t=1700000000,v1={sig}");
        assert_matches!(
            verify_signature("whsec", Some(&header), body, 1_700_000_000),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_body_fails() {
        let sig = sign("whsec", 1_700_000_000, b"original");
        let header = format!("t=1700000000,v1={sig}");
        assert_matches!(
            verify_signature("whsec", Some(&header), b"tampered", 1_700_000_000),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn stale_signature_is_expired() {
        let sig = sign("whsec", 1_700_000_000, b"body");
        let header = format!("t=1700000000,v1={sig}");
        let now = 1_700_000_000 + SIGNATURE_TOLERANCE_SECS + 1;
        assert_matches!(
            verify_signature("whsec", Some(&header), b"body", now),
            Err(WebhookError::Expired)
        );
    }

    #[test]
    fn extreme_timestamps_are_expired() {
        for t in [i64::MIN, i64::MAX] {
            let header = format!("t={t},v1=00");
            assert_matches!(
                verify_signature("whsec", Some(&header), b"x", 1_700_000_000),
                Err(WebhookError::Expired)
            );
        }
    }

    #[test]
    fn missing_header_is_rejected() {
        assert_matches!(
            verify_signature("whsec", None, b"body", 0),
            Err(WebhookError::MissingSignature)
        );
    }

    #[test]
    fn header_without_timestamp_is_invalid() {
        assert_matches!(
            verify_signature("whsec", Some("v1=abcd"), b"body", 0),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn hex_round_trips() {
        let bytes = [0u8, 1, 0xab, 0xff];
        assert_eq!(hex::decode(&hex::encode(bytes)).unwrap(), bytes);
        assert!(hex::decode("abc").is_none());
        assert!(hex::decode("zz").is_none());
    }
}
