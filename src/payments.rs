//! Payment provider gateway: reserve and confirm against the LINE Pay v2 API.
//!
//! The reserve call hands the provider the confirm/cancel redirect URLs with
//! `amount` and `userId` baked into the query string; the provider appends
//! `transactionId` when it redirects the user back. Those echoed parameters
//! are the only correlation state this service ever holds.

use crate::config::AppConfig;
use crate::error::GatewayError;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Outcome of a successful reserve. Not persisted anywhere; the payment URL
/// itself carries everything needed to finish the transaction later.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub transaction_id: i64,
    pub payment_url_web: String,
    pub payment_url_app: String,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn reserve(&self, amount: i64, user_id: &str) -> Result<Reservation, GatewayError>;
    async fn confirm(&self, transaction_id: i64, amount: i64) -> Result<(), GatewayError>;
}

const RETURN_CODE_OK: &str = "0000";

#[derive(Deserialize)]
struct PayApiResponse<T> {
    #[serde(rename = "returnCode")]
    return_code: String,
    #[serde(rename = "returnMessage", default)]
    return_message: String,
    info: Option<T>,
}

#[derive(Deserialize)]
struct ReserveInfo {
    #[serde(rename = "transactionId")]
    transaction_id: i64,
    #[serde(rename = "paymentUrl")]
    payment_url: PaymentUrlInfo,
}

#[derive(Deserialize)]
struct PaymentUrlInfo {
    web: String,
    app: String,
}

pub struct LinePayClient {
    http: reqwest::Client,
    base: String,
    channel_id: String,
    channel_secret: String,
    public_base_url: String,
    currency: String,
}

impl LinePayClient {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            base: config.pay_api_base.clone(),
            channel_id: config.pay_channel_id.clone(),
            channel_secret: config.pay_channel_secret.clone(),
            public_base_url: config.public_base_url.clone(),
            currency: config.currency.clone(),
        }
    }

    /// Build a redirect URL the provider will echo back. Query values are
    /// percent-encoded; they carry the only correlation state this service
    /// has, so they must survive any user id shape intact.
    fn redirect_url(&self, path: &str, pairs: &[(&str, &str)]) -> Result<String, GatewayError> {
        let mut url = reqwest::Url::parse(&format!("{}{}", self.public_base_url, path))
            .map_err(|err| GatewayError::InvalidResponse(format!("invalid public base url: {err}")))?;
        url.query_pairs_mut().extend_pairs(pairs);
        Ok(url.into())
    }

    async fn check<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<PayApiResponse<T>, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Rejected(format!(
                "unexpected status {status}"
            )));
        }
        let parsed: PayApiResponse<T> = response
            .json()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        if parsed.return_code != RETURN_CODE_OK {
            return Err(GatewayError::Rejected(format!(
                "{} {}",
                parsed.return_code, parsed.return_message
            )));
        }
        Ok(parsed)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for LinePayClient {
    async fn reserve(&self, amount: i64, user_id: &str) -> Result<Reservation, GatewayError> {
        let order_id = Uuid::new_v4();
        let amount_value = amount.to_string();
        // The provider appends transactionId to confirmUrl on redirect.
        let confirm_url = self.redirect_url(
            "/confirm",
            &[("amount", amount_value.as_str()), ("userId", user_id)],
        )?;
        let cancel_url = self.redirect_url("/cancel", &[("userId", user_id)])?;
        let body = json!({
            "productName": "Chat payment",
            "amount": amount,
            "currency": self.currency,
            "orderId": order_id,
            "confirmUrl": confirm_url,
            "cancelUrl": cancel_url,
        });

        let response = self
            .http
            .post(format!("{}/v2/payments/request", self.base))
            .header("X-LINE-ChannelId", &self.channel_id)
            .header("X-LINE-ChannelSecret", &self.channel_secret)
            .json(&body)
            .send()
            .await
            .map_err(GatewayError::transport)?;

        let info = Self::check::<ReserveInfo>(response)
            .await?
            .info
            .ok_or_else(|| GatewayError::InvalidResponse("missing info block".into()))?;
        Ok(Reservation {
            transaction_id: info.transaction_id,
            payment_url_web: info.payment_url.web,
            payment_url_app: info.payment_url.app,
        })
    }

    async fn confirm(&self, transaction_id: i64, amount: i64) -> Result<(), GatewayError> {
        let body = json!({
            "amount": amount,
            "currency": self.currency,
        });
        let response = self
            .http
            .post(format!(
                "{}/v2/payments/{}/confirm",
                self.base, transaction_id
            ))
            .header("X-LINE-ChannelId", &self.channel_id)
            .header("X-LINE-ChannelSecret", &self.channel_secret)
            .json(&body)
            .send()
            .await
            .map_err(GatewayError::transport)?;

        Self::check::<serde_json::Value>(response).await?;
        Ok(())
    }
}
