//! Messaging platform gateway: reply and push sends plus message builders.

use crate::config::AppConfig;
use crate::error::GatewayError;
use serde_json::{json, Value};

#[async_trait::async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send an already-built reply payload (one reply token, one use).
    async fn reply(&self, message: Value) -> Result<(), GatewayError>;
    /// Push a canned sticker notification to a user outside any event context.
    async fn push(
        &self,
        user_id: &str,
        package_id: &str,
        sticker_id: &str,
    ) -> Result<(), GatewayError>;
}

/// Buttons template carrying the payment link as a URI action.
pub fn build_template_message(reply_token: &str, payment_url: &str) -> Value {
    json!({
        "replyToken": reply_token,
        "messages": [{
            "type": "template",
            "altText": "Open this message on your phone to pay",
            "template": {
                "type": "buttons",
                "text": "Tap the button to complete your payment",
                "actions": [{
                    "type": "uri",
                    "label": "Pay",
                    "uri": payment_url,
                }],
            },
        }],
    })
}

pub fn build_text_message(reply_token: &str, text: &str) -> Value {
    json!({
        "replyToken": reply_token,
        "messages": [{ "type": "text", "text": text }],
    })
}

pub struct LineMessagingClient {
    http: reqwest::Client,
    base: String,
    access_token: String,
}

impl LineMessagingClient {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            base: config.messaging_api_base.clone(),
            access_token: config.channel_access_token.clone(),
        }
    }

    async fn send(&self, path: &str, body: &Value) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(format!("{}{}", self.base, path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(GatewayError::transport)?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!(
                "status {status}: {detail}"
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MessagingGateway for LineMessagingClient {
    async fn reply(&self, message: Value) -> Result<(), GatewayError> {
        self.send("/v2/bot/message/reply", &message).await
    }

    async fn push(
        &self,
        user_id: &str,
        package_id: &str,
        sticker_id: &str,
    ) -> Result<(), GatewayError> {
        let body = json!({
            "to": user_id,
            "messages": [{
                "type": "sticker",
                "packageId": package_id,
                "stickerId": sticker_id,
            }],
        });
        self.send("/v2/bot/message/push", &body).await
    }
}
