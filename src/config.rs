use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub channel_secret: String,
    pub channel_access_token: String,
    pub pay_channel_id: String,
    pub pay_channel_secret: String,
    pub line_id: String,
    pub public_base_url: String,
    pub messaging_api_base: String,
    pub pay_api_base: String,
    pub currency: String,
    pub gateway_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let channel_secret =
            env::var("LINE_CHANNEL_SECRET").context("LINE_CHANNEL_SECRET must be set")?;
        let channel_access_token = env::var("LINE_CHANNEL_ACCESS_TOKEN")
            .context("LINE_CHANNEL_ACCESS_TOKEN must be set")?;
        let pay_channel_id =
            env::var("LINE_PAY_CHANNEL_ID").context("LINE_PAY_CHANNEL_ID must be set")?;
        let pay_channel_secret =
            env::var("LINE_PAY_CHANNEL_SECRET").context("LINE_PAY_CHANNEL_SECRET must be set")?;
        let line_id = env::var("LINE_ID").context("LINE_ID must be set")?;
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .context("PUBLIC_BASE_URL must be set (confirm/cancel redirect base)")?;
        let messaging_api_base = env::var("LINE_MESSAGING_API_BASE")
            .unwrap_or_else(|_| "https://api.line.me".to_string());
        let pay_api_base = env::var("LINE_PAY_API_BASE")
            .unwrap_or_else(|_| "https://sandbox-api-pay.line.me".to_string());
        let currency = env::var("PAY_CURRENCY").unwrap_or_else(|_| "JPY".to_string());
        let gateway_timeout_secs = env::var("GATEWAY_TIMEOUT_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(10);

        Ok(Self {
            channel_secret,
            channel_access_token,
            pay_channel_id,
            pay_channel_secret,
            line_id,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            messaging_api_base,
            pay_api_base,
            currency,
            gateway_timeout_secs: gateway_timeout_secs.max(1),
        })
    }

    /// Deep link back into the chat app; both redirect endpoints send the
    /// user here regardless of the payment outcome.
    pub fn chat_deep_link(&self) -> String {
        format!("line://ti/p/{}", self.line_id)
    }
}
