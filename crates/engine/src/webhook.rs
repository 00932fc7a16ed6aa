//! Webhook ingestion: signature verification and envelope decoding.
//!
//! Inbound notifications are authenticated with an HMAC-SHA256 signature
//! over the raw body before anything is parsed. Verification fails
//! closed: a bad signature discards the event without touching any job
//! record. Replays are harmless -- de-duplication happens at the
//! reconciler's ordinal fence, not here.

use std::collections::BTreeMap;

use serde::Deserialize;
use vidra_core::artifacts::ArtifactKind;
use vidra_core::classify::JobError;
use vidra_core::lifecycle::JobState;
use vidra_core::webhook::verify_signature;

use crate::event::ReconcileEvent;

/// Header carrying the hex-encoded HMAC-SHA256 signature.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Event type for a progress notification.
pub const EVENT_PROCESSING: &str = "video.processing";
/// Event type for a successful completion.
pub const EVENT_COMPLETED: &str = "video.completed";
/// Event type for a terminal failure.
pub const EVENT_FAILED: &str = "video.failed";

/// Signed event envelope delivered by the provider.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    /// Provider-side event id (logged only).
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

/// Event payload.
#[derive(Debug, Deserialize)]
pub struct WebhookData {
    /// Provider job id the event refers to.
    pub id: String,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub error: Option<String>,
    /// Artifact fetch tokens keyed by variant name, when the provider
    /// includes them on completion events.
    #[serde(default)]
    pub artifacts: BTreeMap<String, String>,
}

/// Errors from webhook ingestion.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Signature verification failed; the event was discarded.
    #[error("Webhook signature verification failed")]
    Unauthorized,

    /// The body passed verification but could not be decoded.
    #[error("Malformed webhook payload: {0}")]
    Malformed(String),
}

/// Result of ingesting a verified notification.
#[derive(Debug)]
pub enum Ingested {
    /// A reconciliation event ready for the reconciler.
    Event(ReconcileEvent),
    /// A verified event of a type this service does not track.
    Ignored { event_type: String },
}

/// Verifies and decodes inbound provider notifications.
pub struct WebhookIngestor {
    secret: String,
}

impl WebhookIngestor {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify the signature over the raw body, decode the envelope, and
    /// map it to a reconciliation event.
    pub fn ingest(&self, body: &[u8], signature: &str) -> Result<Ingested, WebhookError> {
        if !verify_signature(&self.secret, body, signature) {
            tracing::warn!("Rejected webhook with invalid signature");
            return Err(WebhookError::Unauthorized);
        }

        let envelope: WebhookEnvelope =
            serde_json::from_slice(body).map_err(|e| WebhookError::Malformed(e.to_string()))?;

        let provider_job_id = envelope.data.id.clone();
        tracing::debug!(
            event_id = %envelope.id,
            event_type = %envelope.event_type,
            provider_job_id = %provider_job_id,
            "Webhook event received",
        );

        let event = match envelope.event_type.as_str() {
            EVENT_PROCESSING => ReconcileEvent::status_update(
                provider_job_id,
                JobState::Processing,
                envelope.data.progress.unwrap_or(0),
            ),
            EVENT_COMPLETED => ReconcileEvent::completed(
                provider_job_id,
                parse_artifact_tokens(&envelope.data.artifacts),
            ),
            EVENT_FAILED => ReconcileEvent::failed(
                provider_job_id,
                JobError::generation_failed(
                    envelope
                        .data
                        .error
                        .unwrap_or_else(|| "Video generation failed".to_string()),
                ),
            ),
            other => {
                tracing::debug!(event_type = other, "Ignoring unhandled webhook event type");
                return Ok(Ingested::Ignored {
                    event_type: other.to_string(),
                });
            }
        };

        Ok(Ingested::Event(event))
    }
}

/// Map payload artifact tokens onto known kinds; unknown variant names
/// are logged and skipped.
fn parse_artifact_tokens(raw: &BTreeMap<String, String>) -> BTreeMap<ArtifactKind, String> {
    let mut refs = BTreeMap::new();
    for (name, token) in raw {
        match ArtifactKind::parse(name) {
            Some(kind) => {
                refs.insert(kind, token.clone());
            }
            None => {
                tracing::warn!(variant = %name, "Unknown artifact variant in webhook payload");
            }
        }
    }
    refs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
