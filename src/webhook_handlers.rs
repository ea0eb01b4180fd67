use crate::app_state::AppState;
use crate::events::{decode_events, InboundKind};
use crate::signature::verify_signature;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use tracing::{debug, warn};

const X_LINE_SIGNATURE: &str = "X-Line-Signature";

/// `POST /callback` — the platform webhook.
///
/// Signature failure is the only non-200 outcome. Once the body is
/// authenticated the endpoint always answers 200: the platform treats any
/// other status as a redelivery signal, which would duplicate side effects.
pub async fn handle_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(X_LINE_SIGNATURE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !verify_signature(&state.config.channel_secret, signature, &body) {
        warn!("webhook signature missing or invalid");
        return StatusCode::BAD_REQUEST;
    }

    let events = match decode_events(&body) {
        Ok(events) => events,
        Err(err) => {
            warn!(error = %err, "failed to decode webhook payload");
            return StatusCode::OK;
        }
    };

    for event in events {
        if event.kind != InboundKind::Message {
            debug!("skipping non-message event");
            continue;
        }
        // One event failing must not abort its siblings.
        if let Err(err) = state.orchestrator.handle_message(&event).await {
            warn!(error = %err, user_id = %event.user_id, "message handling failed");
        }
    }

    StatusCode::OK
}
