//! Webhook payload model and normalization into [`InboundEvent`]s.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(rename = "replyToken", default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub message: Option<EventMessage>,
}

#[derive(Debug, Deserialize)]
pub struct EventSource {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventMessage {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundKind {
    Message,
    Other,
}

/// One chat event, scoped to a single webhook delivery.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub kind: InboundKind,
    pub reply_token: String,
    pub user_id: String,
    pub text: Option<String>,
}

/// Decode a verified webhook body into the ordered event sequence.
/// Event types other than `message` come out as [`InboundKind::Other`]
/// and are skipped by the boundary.
pub fn decode_events(raw_body: &[u8]) -> Result<Vec<InboundEvent>, serde_json::Error> {
    let payload: WebhookPayload = serde_json::from_slice(raw_body)?;
    Ok(payload
        .events
        .into_iter()
        .map(|event| {
            let kind = if event.event_type == "message" {
                InboundKind::Message
            } else {
                InboundKind::Other
            };
            InboundEvent {
                kind,
                reply_token: event.reply_token.unwrap_or_default(),
                user_id: event
                    .source
                    .and_then(|source| source.user_id)
                    .unwrap_or_default(),
                text: event.message.and_then(|message| message.text),
            }
        })
        .collect())
}
