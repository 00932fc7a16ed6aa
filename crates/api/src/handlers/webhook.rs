//! Handler for inbound provider webhook notifications.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use vidra_engine::{Ingested, SIGNATURE_HEADER};

use crate::error::AppResult;
use crate::state::AppState;

/// POST /api/v1/provider/webhook
///
/// Accepts a signed event envelope. Responds 200 on accept -- including
/// idempotent re-delivery, where the reconciler fences out the duplicate
/// -- and 401 on signature failure, without touching any job record.
pub async fn provider_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    match state.webhook.ingest(&body, signature)? {
        Ingested::Event(event) => {
            let outcome = state.reconciler.apply(event).await;
            tracing::debug!(?outcome, "Webhook event reconciled");
            Ok(Json(json!({ "status": "processed" })))
        }
        Ingested::Ignored { event_type } => {
            tracing::debug!(event_type, "Webhook event type ignored");
            Ok(Json(json!({ "status": "ignored" })))
        }
    }
}
