use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use chatpay_gateway::{
    router, AppConfig, AppState, GatewayError, MessagingGateway, Orchestrator, PaymentGateway,
    Reservation,
};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const SECRET: &str = "s3cr3t";

fn test_config() -> AppConfig {
    AppConfig {
        channel_secret: SECRET.to_string(),
        channel_access_token: "token".to_string(),
        pay_channel_id: "cid".to_string(),
        pay_channel_secret: "csec".to_string(),
        line_id: "@chatpay".to_string(),
        public_base_url: "https://example.test".to_string(),
        messaging_api_base: "https://api.line.me".to_string(),
        pay_api_base: "https://sandbox-api-pay.line.me".to_string(),
        currency: "JPY".to_string(),
        gateway_timeout_secs: 10,
    }
}

#[derive(Default)]
struct RecordingMessaging {
    replies: Mutex<Vec<Value>>,
    pushes: Mutex<Vec<(String, String, String)>>,
    fail_replies: bool,
}

#[async_trait]
impl MessagingGateway for RecordingMessaging {
    async fn reply(&self, message: Value) -> Result<(), GatewayError> {
        self.replies.lock().unwrap().push(message);
        if self.fail_replies {
            return Err(GatewayError::Rejected("status 500".into()));
        }
        Ok(())
    }

    async fn push(
        &self,
        user_id: &str,
        package_id: &str,
        sticker_id: &str,
    ) -> Result<(), GatewayError> {
        self.pushes.lock().unwrap().push((
            user_id.to_string(),
            package_id.to_string(),
            sticker_id.to_string(),
        ));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPayments {
    reserve_calls: Mutex<Vec<(i64, String)>>,
    confirm_calls: Mutex<Vec<(i64, i64)>>,
    fail_reserve: bool,
}

#[async_trait]
impl PaymentGateway for RecordingPayments {
    async fn reserve(&self, amount: i64, user_id: &str) -> Result<Reservation, GatewayError> {
        self.reserve_calls
            .lock()
            .unwrap()
            .push((amount, user_id.to_string()));
        if self.fail_reserve {
            return Err(GatewayError::Rejected("1104 merchant not found".into()));
        }
        Ok(Reservation {
            transaction_id: 2022111600000001,
            payment_url_web: "https://pay.example/web/1".to_string(),
            payment_url_app: "line://pay/app/1".to_string(),
        })
    }

    async fn confirm(&self, transaction_id: i64, amount: i64) -> Result<(), GatewayError> {
        self.confirm_calls
            .lock()
            .unwrap()
            .push((transaction_id, amount));
        Ok(())
    }
}

fn test_app(
    messaging: Arc<RecordingMessaging>,
    payments: Arc<RecordingPayments>,
) -> axum::Router {
    let state = AppState {
        config: Arc::new(test_config()),
        orchestrator: Arc::new(Orchestrator::new(payments, messaging)),
    };
    router(state)
}

fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

fn message_event(reply_token: &str, user_id: &str, text: &str) -> Value {
    serde_json::json!({
        "type": "message",
        "replyToken": reply_token,
        "source": {"type": "user", "userId": user_id},
        "message": {"type": "text", "text": text},
    })
}

fn callback_request(body: Vec<u8>, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri("/callback")
        .method("POST")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header("X-Line-Signature", sig);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn missing_signature_is_400_and_no_gateway_calls() {
    let messaging = Arc::new(RecordingMessaging::default());
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(messaging.clone(), payments.clone());

    let body = serde_json::json!({"events": [message_event("rt", "U1", "pay 500")]});
    let req = callback_request(body.to_string().into_bytes(), None);
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status().as_u16(), 400);
    assert!(payments.reserve_calls.lock().unwrap().is_empty());
    assert!(messaging.replies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_signature_is_400() {
    let messaging = Arc::new(RecordingMessaging::default());
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(messaging.clone(), payments.clone());

    let body = serde_json::json!({"events": []}).to_string().into_bytes();
    let sig = sign("wrong-secret", &body);
    let resp = app.oneshot(callback_request(body, Some(&sig))).await.unwrap();

    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn one_reply_per_message_event() {
    let messaging = Arc::new(RecordingMessaging::default());
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(messaging.clone(), payments.clone());

    let body = serde_json::json!({"events": [
        message_event("rt-1", "U1", "hello"),
        message_event("rt-2", "U2", "pay 500"),
    ]})
    .to_string()
    .into_bytes();
    let sig = sign(SECRET, &body);
    let resp = app.oneshot(callback_request(body, Some(&sig))).await.unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(messaging.replies.lock().unwrap().len(), 2);
    // Only the pay command reaches the payment gateway.
    assert_eq!(
        payments.reserve_calls.lock().unwrap().as_slice(),
        &[(500, "U2".to_string())]
    );
}

#[tokio::test]
async fn non_message_events_are_skipped() {
    let messaging = Arc::new(RecordingMessaging::default());
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(messaging.clone(), payments.clone());

    let body = serde_json::json!({"events": [
        {"type": "follow", "replyToken": "rt-1", "source": {"userId": "U1"}},
        message_event("rt-2", "U1", "pay 10"),
    ]})
    .to_string()
    .into_bytes();
    let sig = sign(SECRET, &body);
    let resp = app.oneshot(callback_request(body, Some(&sig))).await.unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(messaging.replies.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failing_reply_does_not_block_siblings_and_still_200() {
    let messaging = Arc::new(RecordingMessaging {
        fail_replies: true,
        ..Default::default()
    });
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(messaging.clone(), payments.clone());

    let body = serde_json::json!({"events": [
        message_event("rt-1", "U1", "pay 100"),
        message_event("rt-2", "U2", "pay 200"),
    ]})
    .to_string()
    .into_bytes();
    let sig = sign(SECRET, &body);
    let resp = app.oneshot(callback_request(body, Some(&sig))).await.unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    // Both reply attempts were made despite the first failing.
    assert_eq!(messaging.replies.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn successful_reserve_reply_embeds_payment_url() {
    let messaging = Arc::new(RecordingMessaging::default());
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(messaging.clone(), payments.clone());

    let body = serde_json::json!({"events": [message_event("rt-1", "U1", "PAY 10")]})
        .to_string()
        .into_bytes();
    let sig = sign(SECRET, &body);
    app.oneshot(callback_request(body, Some(&sig))).await.unwrap();

    let replies = messaging.replies.lock().unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["replyToken"], "rt-1");
    assert_eq!(
        replies[0]["messages"][0]["template"]["actions"][0]["uri"],
        "line://pay/app/1"
    );
}

#[tokio::test]
async fn failed_reserve_replies_without_payment_link() {
    let messaging = Arc::new(RecordingMessaging::default());
    let payments = Arc::new(RecordingPayments {
        fail_reserve: true,
        ..Default::default()
    });
    let app = test_app(messaging.clone(), payments.clone());

    let body = serde_json::json!({"events": [message_event("rt-1", "U1", "pay 500")]})
        .to_string()
        .into_bytes();
    let sig = sign(SECRET, &body);
    let resp = app.oneshot(callback_request(body, Some(&sig))).await.unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let replies = messaging.replies.lock().unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["messages"][0]["type"], "text");
    assert!(!serde_json::to_string(&replies[0]).unwrap().contains("pay.example"));
}

#[tokio::test]
async fn non_pay_text_gets_usage_reply_and_no_reserve() {
    let messaging = Arc::new(RecordingMessaging::default());
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(messaging.clone(), payments.clone());

    for text in ["hello", "pay", "Pay abc"] {
        let body = serde_json::json!({"events": [message_event("rt", "U1", text)]})
            .to_string()
            .into_bytes();
        let sig = sign(SECRET, &body);
        let resp = app
            .clone()
            .oneshot(callback_request(body, Some(&sig)))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    assert!(payments.reserve_calls.lock().unwrap().is_empty());
    let replies = messaging.replies.lock().unwrap();
    assert_eq!(replies.len(), 3);
    assert!(replies
        .iter()
        .all(|reply| reply["messages"][0]["type"] == "text"));
}

#[tokio::test]
async fn undecodable_body_after_valid_signature_still_200() {
    let messaging = Arc::new(RecordingMessaging::default());
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(messaging.clone(), payments.clone());

    let body = b"not json".to_vec();
    let sig = sign(SECRET, &body);
    let resp = app.oneshot(callback_request(body, Some(&sig))).await.unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    assert!(messaging.replies.lock().unwrap().is_empty());
}
